use bevy::prelude::*;
use bevy_enhanced_input::prelude::*;

use crate::events::SprintCommandsExt;
use crate::sprint::SprintComponent;

#[derive(InputAction)]
#[action_output(bool)]
/// Held to sprint. Fires every tick while held and completes on release.
pub struct SprintAction;

pub(crate) fn forward_sprint_fire(
    fire: On<Fire<SprintAction>>,
    sprints: Query<&SprintComponent>,
    mut commands: Commands,
) {
    forward(fire.event_target(), fire.action, true, &sprints, &mut commands);
}

pub(crate) fn forward_sprint_complete(
    complete: On<Complete<SprintAction>>,
    sprints: Query<&SprintComponent>,
    mut commands: Commands,
) {
    forward(
        complete.event_target(),
        complete.action,
        false,
        &sprints,
        &mut commands,
    );
}

fn forward(
    context: Entity,
    action: Entity,
    active: bool,
    sprints: &Query<&SprintComponent>,
    commands: &mut Commands,
) {
    let Ok(sprint) = sprints.get(context) else {
        return;
    };

    // Other sprint actions on the same context are not ours.
    if sprint.input_action() == Some(action) {
        commands.request_sprint(context, active);
    }
}
