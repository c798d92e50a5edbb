use std::collections::VecDeque;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::movement::{CharacterMovement, Locomotion, Rotator, SprintTuning};

#[derive(Serialize, Deserialize, Component, Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[reflect(Component)]
#[require(SprintNotifier)]
/// Replicated sprint flag. Only the authority writes it.
pub struct Sprinting(pub bool);

impl Sprinting {
    pub fn get(&self) -> bool {
        self.0
    }
}

#[derive(Component, Debug, Default)]
/// Sprint requests waiting for the authority, oldest first
pub struct SprintIntentQueue(VecDeque<bool>);

impl SprintIntentQueue {
    pub fn push(&mut self, active: bool) {
        self.0.push_back(active);
    }

    pub fn pop(&mut self) -> Option<bool> {
        self.0.pop_front()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SprintTransition {
    Started,
    Stopped,
}

#[derive(Component, Debug, Default)]
/// Last sprint value this peer has announced
pub struct SprintNotifier {
    observed: bool,
}

impl SprintNotifier {
    /// Records `sprinting` and reports the transition if it differs from the last observed value.
    pub fn observe(&mut self, sprinting: bool) -> Option<SprintTransition> {
        if self.observed == sprinting {
            return None;
        }
        self.observed = sprinting;

        Some(if sprinting {
            SprintTransition::Started
        } else {
            SprintTransition::Stopped
        })
    }

    pub fn observed(&self) -> bool {
        self.observed
    }
}

/// Toggles a character between its captured default locomotion and the sprint tuning.
///
/// The component never owns the movement it drives: [`SprintComponent::capture_defaults`]
/// remembers which entity holds the [`CharacterMovement`] and what its values were before
/// any sprint touched them, and [`SprintComponent::apply`] writes either the tuning or
/// those defaults back to it.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
#[require(Sprinting, SprintIntentQueue)]
pub struct SprintComponent {
    tuning: Locomotion,
    input_action: Option<Entity>,
    defaults: Option<Locomotion>,
    movement_target: Option<Entity>,
    hold_time: f32,
    input_bound: bool,
}

impl Default for SprintComponent {
    fn default() -> Self {
        Self::new(*SprintTuning::default())
    }
}

impl SprintComponent {
    pub fn new(tuning: Locomotion) -> Self {
        Self {
            tuning,
            input_action: None,
            defaults: None,
            movement_target: None,
            hold_time: 0.0,
            input_bound: false,
        }
    }

    pub fn with_input_action(mut self, action: Entity) -> Self {
        self.input_action = Some(action);
        self
    }

    /// Stores the current values of `movement` as the defaults to restore when sprinting stops.
    ///
    /// Only the first call has any effect; returns whether this call captured.
    pub fn capture_defaults(&mut self, target: Entity, movement: &CharacterMovement) -> bool {
        if self.defaults.is_some() {
            return false;
        }

        self.defaults = Some(Locomotion::read(movement));
        self.movement_target = Some(target);
        true
    }

    /// Applies one sprint request. Must only run on the authority.
    ///
    /// The flag, hold time and movement are updated even when `active` matches the current
    /// state. `movement` is ignored until defaults have been captured.
    ///
    /// Every `active` request adds `delta_secs` to the hold time, so a request delivered twice
    /// within one tick counts that tick twice.
    pub fn apply(
        &mut self,
        sprinting: &mut bool,
        active: bool,
        delta_secs: f32,
        movement: Option<&mut CharacterMovement>,
    ) {
        *sprinting = active;

        if active {
            self.hold_time += delta_secs.max(0.0);
        } else {
            self.hold_time = 0.0;
        }

        let (Some(defaults), Some(movement)) = (self.defaults, movement) else {
            return;
        };

        if active {
            self.tuning.write_to(movement);
        } else {
            defaults.write_to(movement);
        }
    }

    pub(crate) fn mark_input_bound(&mut self) -> bool {
        !std::mem::replace(&mut self.input_bound, true)
    }

    pub fn hold_time(&self) -> f32 {
        self.hold_time
    }

    pub fn tuning(&self) -> Locomotion {
        self.tuning
    }

    pub fn sprint_speed(&self) -> f32 {
        self.tuning.speed
    }

    pub fn sprint_turn_rate(&self) -> Rotator {
        self.tuning.turn_rate
    }

    pub fn defaults(&self) -> Option<Locomotion> {
        self.defaults
    }

    pub fn movement_target(&self) -> Option<Entity> {
        self.movement_target
    }

    pub fn input_action(&self) -> Option<Entity> {
        self.input_action
    }

    pub fn is_input_bound(&self) -> bool {
        self.input_bound
    }

    /// Takes effect on the next request.
    pub fn set_tuning(&mut self, tuning: Locomotion) {
        self.tuning = tuning;
    }

    pub fn set_sprint_speed(&mut self, speed: f32) {
        self.tuning.speed = speed;
    }

    pub fn set_sprint_turn_rate(&mut self, turn_rate: Rotator) {
        self.tuning.turn_rate = turn_rate;
    }

    /// Changing the action after input was bound does not rebind the callbacks, but they
    /// filter on the stored action, so the new one is picked up.
    pub fn set_input_action(&mut self, action: Option<Entity>) {
        self.input_action = action;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: Entity = Entity::PLACEHOLDER;

    fn walking() -> CharacterMovement {
        CharacterMovement {
            max_walk_speed: 600.0,
            rotation_rate: Rotator::from_yaw(45.0),
        }
    }

    fn bound_sprint(movement: &CharacterMovement) -> SprintComponent {
        let mut sprint = SprintComponent::default();
        assert!(sprint.capture_defaults(TARGET, movement));
        sprint
    }

    #[test]
    fn default_tuning() {
        let sprint = SprintComponent::default();
        assert_eq!(sprint.sprint_speed(), 1000.0);
        assert_eq!(sprint.sprint_turn_rate(), Rotator::from_yaw(50.0));
        assert_eq!(sprint.defaults(), None);
        assert_eq!(sprint.movement_target(), None);
    }

    #[test]
    fn capture_happens_once() {
        let mut movement = walking();
        let mut sprint = bound_sprint(&movement);
        let mut sprinting = false;

        sprint.apply(&mut sprinting, true, 0.016, Some(&mut movement));
        assert!(!sprint.capture_defaults(TARGET, &movement));

        assert_eq!(
            sprint.defaults(),
            Some(Locomotion::new(600.0, Rotator::from_yaw(45.0)))
        );
    }

    #[test]
    fn hold_time_accumulates_while_held() {
        let mut movement = walking();
        let mut sprint = bound_sprint(&movement);
        let mut sprinting = false;

        for delta in [0.016, 0.020, 0.033, 0.008] {
            sprint.apply(&mut sprinting, true, delta, Some(&mut movement));
        }

        assert!(sprinting);
        assert!((sprint.hold_time() - 0.077).abs() < 1e-5);
    }

    #[test]
    fn release_restores_defaults_and_resets_hold_time() {
        let mut movement = walking();
        let mut sprint = bound_sprint(&movement);
        let mut sprinting = false;

        for active in [true, true, false, true, false, false] {
            sprint.apply(&mut sprinting, active, 0.016, Some(&mut movement));
        }

        assert!(!sprinting);
        assert_eq!(sprint.hold_time(), 0.0);
        assert_eq!(movement, walking());
    }

    #[test]
    fn unbound_movement_still_toggles_state() {
        let mut movement = walking();
        let mut sprint = SprintComponent::default();
        let mut sprinting = false;

        sprint.apply(&mut sprinting, true, 0.016, Some(&mut movement));

        assert!(sprinting);
        assert_eq!(movement, walking());
        assert!(sprint.hold_time() > 0.0);
    }

    #[test]
    fn negative_delta_does_not_reduce_hold_time() {
        let mut sprint = SprintComponent::default();
        let mut sprinting = false;

        sprint.apply(&mut sprinting, true, 0.5, None);
        sprint.apply(&mut sprinting, true, -1.0, None);

        assert_eq!(sprint.hold_time(), 0.5);
    }

    #[test]
    fn tuning_changes_apply_on_next_request() {
        let mut movement = walking();
        let mut sprint = bound_sprint(&movement);
        let mut sprinting = false;

        sprint.set_sprint_speed(1400.0);
        sprint.set_sprint_turn_rate(Rotator::new(0.0, 90.0, 10.0));
        sprint.apply(&mut sprinting, true, 0.016, Some(&mut movement));

        assert_eq!(movement.max_walk_speed, 1400.0);
        assert_eq!(movement.rotation_rate, Rotator::new(0.0, 90.0, 10.0));
    }

    #[test]
    fn notifier_reports_only_changes() {
        let mut notifier = SprintNotifier::default();

        assert_eq!(notifier.observe(false), None);
        assert_eq!(notifier.observe(true), Some(SprintTransition::Started));
        assert_eq!(notifier.observe(true), None);
        assert_eq!(notifier.observe(false), Some(SprintTransition::Stopped));
        assert!(!notifier.observed());
    }

    #[test]
    fn input_is_marked_bound_once() {
        let mut sprint = SprintComponent::default();
        assert!(sprint.mark_input_bound());
        assert!(!sprint.mark_input_bound());
        assert!(sprint.is_input_bound());
    }
}
