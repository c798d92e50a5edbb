use bevy::prelude::*;
use bevy_replicon::prelude::*;

pub mod events;
pub mod input;
pub mod movement;
pub mod sprint;
mod systems;

pub use events::{
    BindSprint, SprintCommandsExt, SprintIntent, SprintRequest, SprintStarted, SprintStopped,
};
pub use input::SprintAction;
pub use movement::{CharacterMovement, Locomotion, Rotator, SprintTuning};
pub use sprint::{SprintComponent, SprintIntentQueue, SprintNotifier, SprintTransition, Sprinting};

#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Whether this peer is allowed to change sprint state or only observes it
pub enum PeerRole {
    #[default]
    Authority,
    Observer,
}

pub fn is_authority(role: Res<PeerRole>) -> bool {
    matches!(*role, PeerRole::Authority)
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SprintSystems;

/// Sprint binding, request routing, the authority applier and change notifications.
///
/// Transport agnostic: pair it with [`SprintReplicationExt::add_sprint_replication`] when
/// running over replicon.
pub struct SprintPlugin;

impl Plugin for SprintPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PeerRole>()
            .add_observer(systems::bind_added_sprint)
            .add_observer(systems::bind_added_movement)
            .add_observer(systems::bind_sprint)
            .add_observer(systems::route_sprint_request)
            .add_systems(
                Update,
                (
                    systems::apply_sprint_intents.run_if(is_authority),
                    systems::notify_sprint_changes,
                )
                    .chain()
                    .in_set(SprintSystems),
            );
    }
}

pub trait SprintReplicationExt {
    /// Registers the client intent event and the one replicated sprint component.
    fn add_sprint_replication(&mut self) -> &mut Self;
}

impl SprintReplicationExt for App {
    fn add_sprint_replication(&mut self) -> &mut Self {
        self.add_client_event::<SprintIntent>(Channel::Ordered)
            .replicate::<Sprinting>()
    }
}
