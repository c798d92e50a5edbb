use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Event)]
/// Client -> Server event asking the authority to start or stop sprinting the sender's character
pub struct SprintIntent {
    pub active: bool,
}

#[derive(EntityEvent, Debug, Clone, Copy)]
/// Local request to sprint, routed to the authority queue or over the network depending on [`crate::PeerRole`]
pub struct SprintRequest {
    pub entity: Entity,
    pub active: bool,
}

/// Binds a sprint component to its movement target and input action.
///
/// Triggered automatically when a [`crate::SprintComponent`] or [`crate::CharacterMovement`]
/// is added. Safe to trigger again: defaults are captured and input is bound at most once.
#[derive(EntityEvent, Debug, Clone, Copy)]
pub struct BindSprint {
    pub entity: Entity,
}

#[derive(EntityEvent, Debug, Clone, Copy)]
pub struct SprintStarted {
    pub entity: Entity,
}

#[derive(EntityEvent, Debug, Clone, Copy)]
pub struct SprintStopped {
    pub entity: Entity,
}

pub trait SprintCommandsExt {
    fn request_sprint(&mut self, entity: Entity, active: bool);
}

impl SprintCommandsExt for Commands<'_, '_> {
    fn request_sprint(&mut self, entity: Entity, active: bool) {
        self.trigger(SprintRequest { entity, active });
    }
}
