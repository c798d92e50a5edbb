use bevy::prelude::*;
use bevy_enhanced_input::prelude::*;
use bevy_replicon::prelude::*;

use crate::PeerRole;
use crate::events::{BindSprint, SprintIntent, SprintRequest, SprintStarted, SprintStopped};
use crate::input::{SprintAction, forward_sprint_complete, forward_sprint_fire};
use crate::movement::CharacterMovement;
use crate::sprint::{SprintComponent, SprintIntentQueue, SprintNotifier, SprintTransition, Sprinting};

pub(crate) fn bind_added_sprint(add: On<Add, SprintComponent>, mut commands: Commands) {
    commands.trigger(BindSprint { entity: add.entity });
}

/// Movement may arrive after the sprint, on the owner itself or on one of its children.
pub(crate) fn bind_added_movement(
    add: On<Add, CharacterMovement>,
    parents: Query<&ChildOf>,
    mut commands: Commands,
) {
    commands.trigger(BindSprint { entity: add.entity });
    if let Ok(child_of) = parents.get(add.entity) {
        commands.trigger(BindSprint {
            entity: child_of.parent(),
        });
    }
}

pub(crate) fn bind_sprint(
    bind: On<BindSprint>,
    mut sprints: Query<(&mut SprintComponent, &Sprinting)>,
    mut movements: Query<&mut CharacterMovement>,
    children: Query<&Children>,
    actions: Query<(), With<Action<SprintAction>>>,
    mut commands: Commands,
) {
    let entity = bind.entity;
    let Ok((mut sprint, sprinting)) = sprints.get_mut(entity) else {
        return;
    };

    if sprint.defaults().is_none() {
        let target = find_movement(entity, &movements, &children);
        match target.and_then(|target| movements.get_mut(target).ok().map(|m| (target, m))) {
            Some((target, mut movement)) => {
                sprint.capture_defaults(target, &movement);
                debug!(
                    "{entity}: captured default locomotion {:?} from {target}",
                    sprint.defaults()
                );

                // Already sprinting when the movement showed up.
                if sprinting.get() {
                    sprint.tuning().write_to(&mut movement);
                }
            }
            None => debug!("{entity}: no movement to drive, sprint will not change speed"),
        }
    }

    match sprint.input_action() {
        Some(action) if actions.contains(action) => {
            if sprint.mark_input_bound() {
                commands
                    .entity(entity)
                    .observe(forward_sprint_fire)
                    .observe(forward_sprint_complete);
                debug!("{entity}: bound sprint input to action {action}");
            }
        }
        _ => debug!("{entity}: no sprint action to bind, input will not be received"),
    }
}

fn find_movement(
    entity: Entity,
    movements: &Query<&mut CharacterMovement>,
    children: &Query<&Children>,
) -> Option<Entity> {
    if movements.contains(entity) {
        return Some(entity);
    }

    let children: &[Entity] = children.get(entity).ok()?;
    children.iter().copied().find(|&child| movements.contains(child))
}

pub(crate) fn route_sprint_request(
    request: On<SprintRequest>,
    role: Res<PeerRole>,
    mut queues: Query<&mut SprintIntentQueue>,
    mut commands: Commands,
) {
    match *role {
        PeerRole::Authority => match queues.get_mut(request.entity) {
            Ok(mut queue) => queue.push(request.active),
            Err(_) => debug!("{}: sprint request for a non-sprinting entity", request.entity),
        },
        PeerRole::Observer => {
            commands.client_trigger(SprintIntent {
                active: request.active,
            });
        }
    }
}

pub(crate) fn apply_sprint_intents(
    time: Res<Time>,
    mut sprints: Query<(
        Entity,
        &mut SprintComponent,
        &mut Sprinting,
        &mut SprintIntentQueue,
        &mut SprintNotifier,
    )>,
    mut movements: Query<&mut CharacterMovement>,
    mut commands: Commands,
) {
    let delta_secs = time.delta_secs();

    for (entity, mut sprint, mut sprinting, mut queue, mut notifier) in &mut sprints {
        if queue.is_empty() {
            continue;
        }

        let mut active_now = sprinting.get();
        while let Some(active) = queue.pop() {
            let mut movement = sprint
                .movement_target()
                .and_then(|target| movements.get_mut(target).ok());
            sprint.apply(&mut active_now, active, delta_secs, movement.as_deref_mut());

            if let Some(transition) = notifier.observe(active_now) {
                announce(&mut commands, entity, transition);
            }
        }

        sprinting.set_if_neq(Sprinting(active_now));
    }
}

/// Announces changes that arrived through replication. Changes made by the authority were
/// already announced while applying, so the notifier sees nothing new for them.
pub(crate) fn notify_sprint_changes(
    mut sprints: Query<(Entity, &Sprinting, &mut SprintNotifier), Changed<Sprinting>>,
    mut commands: Commands,
) {
    for (entity, sprinting, mut notifier) in &mut sprints {
        if let Some(transition) = notifier.observe(sprinting.get()) {
            announce(&mut commands, entity, transition);
        }
    }
}

fn announce(commands: &mut Commands, entity: Entity, transition: SprintTransition) {
    debug!("{entity}: sprint {transition:?}");
    match transition {
        SprintTransition::Started => commands.trigger(SprintStarted { entity }),
        SprintTransition::Stopped => commands.trigger(SprintStopped { entity }),
    }
}
