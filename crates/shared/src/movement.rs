use bevy::prelude::*;

#[derive(Reflect, Debug, Clone, Copy, PartialEq, Default)]
/// Turn rate in degrees per second around each axis
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotator {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    pub const fn from_yaw(yaw: f32) -> Self {
        Self::new(0.0, yaw, 0.0)
    }
}

#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
/// The movement state a sprint writes to. Owned by the character, never by the sprint itself.
pub struct CharacterMovement {
    pub max_walk_speed: f32,
    pub rotation_rate: Rotator,
}

impl Default for CharacterMovement {
    fn default() -> Self {
        Self {
            max_walk_speed: 600.0,
            rotation_rate: Rotator::from_yaw(360.0),
        }
    }
}

#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
/// Speed and turn rate pair, used both for sprint tuning and for captured defaults
pub struct Locomotion {
    pub speed: f32,
    pub turn_rate: Rotator,
}

impl Locomotion {
    pub const fn new(speed: f32, turn_rate: Rotator) -> Self {
        Self { speed, turn_rate }
    }

    pub fn read(movement: &CharacterMovement) -> Self {
        Self::new(movement.max_walk_speed, movement.rotation_rate)
    }

    pub fn write_to(&self, movement: &mut CharacterMovement) {
        movement.max_walk_speed = self.speed;
        movement.rotation_rate = self.turn_rate;
    }
}

#[derive(Resource, Reflect, Debug, Clone, Copy, PartialEq, Deref, DerefMut)]
#[reflect(Resource)]
/// Tuning handed to newly spawned sprinting characters
pub struct SprintTuning(pub Locomotion);

impl Default for SprintTuning {
    fn default() -> Self {
        Self(Locomotion::new(1000.0, Rotator::from_yaw(50.0)))
    }
}
