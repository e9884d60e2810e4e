//! Third-person motor: direct velocity composition and heading smoothing.
#![forbid(unsafe_code)]

use std::f32::consts::{PI, TAU};

use rapier3d::math::Vector;
use rapier3d::prelude::Real;

const MIN_MOVE_LEN2: Real = 1.0e-8;

#[derive(Clone, Copy, Debug)]
pub struct TpsMotorConfig {
    pub walk_speed: Real,
    pub run_speed: Real,
    pub always_run: bool,
    pub climb_up_speed: Real,
    pub climb_down_speed: Real,
    /// Heading decay rate; the fraction closed per tick is `rotate_speed * dt`.
    pub rotate_speed: Real,
}

impl Default for TpsMotorConfig {
    fn default() -> Self {
        Self {
            walk_speed: 2.5,
            run_speed: 5.0,
            always_run: false,
            climb_up_speed: 2.0,
            climb_down_speed: 3.0,
            rotate_speed: 10.0,
        }
    }
}

/// Vertical intent while attached to a ladder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClimbDirection {
    Up,
    Down,
    Hold,
}

impl ClimbDirection {
    /// Full-deflection vertical input climbs; anything else holds.
    pub fn from_axis(axis_y: Real) -> Self {
        if axis_y == 1.0 {
            ClimbDirection::Up
        } else if axis_y == -1.0 {
            ClimbDirection::Down
        } else {
            ClimbDirection::Hold
        }
    }

    pub fn is_moving(self) -> bool {
        self != ClimbDirection::Hold
    }

    /// Animation-facing climb speed: 1, -1 or 0.
    pub fn signal(self) -> Real {
        match self {
            ClimbDirection::Up => 1.0,
            ClimbDirection::Down => -1.0,
            ClimbDirection::Hold => 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TpsMotorInput {
    pub move_axis: [Real; 2],
    pub run: bool,
    /// Horizontal unit forward of the camera.
    pub forward: Vector<Real>,
    /// Horizontal unit right of the camera.
    pub right: Vector<Real>,
    /// `Some` while attached to a ladder.
    pub climb: Option<ClimbDirection>,
}

#[derive(Clone, Copy, Debug)]
pub struct TpsMotorState {
    pub velocity: Vector<Real>,
}

#[derive(Clone, Copy, Debug)]
pub struct TpsMotorOutput {
    /// Horizontal move vector, already scaled by `speed`.
    pub planar_move: Vector<Real>,
    pub next_velocity: Vector<Real>,
    pub speed: Real,
}

pub struct TpsMotor {
    config: TpsMotorConfig,
}

impl TpsMotor {
    pub fn new(config: TpsMotorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> TpsMotorConfig {
        self.config
    }

    pub fn config_mut(&mut self) -> &mut TpsMotorConfig {
        &mut self.config
    }

    pub fn is_running(&self, run_held: bool) -> bool {
        run_held || self.config.always_run
    }

    pub fn active_speed(&self, run_held: bool) -> Real {
        if self.is_running(run_held) {
            self.config.run_speed
        } else {
            self.config.walk_speed
        }
    }

    pub fn step(&self, input: TpsMotorInput, state: TpsMotorState) -> TpsMotorOutput {
        let speed = self.active_speed(input.run);
        let climbing = input.climb.map(ClimbDirection::is_moving).unwrap_or(false);
        let planar_move = compose_move(
            input.forward,
            input.right,
            input.move_axis,
            climbing,
            speed,
        );
        let vertical = match input.climb {
            Some(ClimbDirection::Up) => self.config.climb_up_speed,
            Some(ClimbDirection::Down) => -self.config.climb_down_speed,
            Some(ClimbDirection::Hold) => 0.0,
            None => state.velocity.y,
        };
        TpsMotorOutput {
            planar_move,
            next_velocity: Vector::new(planar_move.x, vertical, planar_move.z),
            speed,
        }
    }
}

/// Camera-relative move vector. The direction is normalized before scaling so
/// diagonal input never exceeds `speed`; zero input yields zero.
pub fn compose_move(
    forward: Vector<Real>,
    right: Vector<Real>,
    axis: [Real; 2],
    suppress_forward: bool,
    speed: Real,
) -> Vector<Real> {
    let horizontal = right * axis[0];
    let vertical = if suppress_forward {
        Vector::zeros()
    } else {
        forward * axis[1]
    };
    let wish = horizontal + vertical;
    if wish.norm_squared() <= MIN_MOVE_LEN2 {
        return Vector::zeros();
    }
    wish.normalize() * speed
}

/// Heading (radians, 0 faces -Z, positive turns toward +X) of a horizontal direction.
pub fn heading_of(dir: Vector<Real>) -> Option<Real> {
    if dir.x * dir.x + dir.z * dir.z <= MIN_MOVE_LEN2 {
        return None;
    }
    Some(dir.x.atan2(-dir.z))
}

pub fn heading_forward(heading: Real) -> Vector<Real> {
    let (sin, cos) = heading.sin_cos();
    Vector::new(sin, 0.0, -cos)
}

/// Wraps an angle into `[-PI, PI)`.
pub fn wrap_angle(angle: Real) -> Real {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Moves `current` toward `target` along the shorter arc by the fraction
/// `rotate_speed * dt` (clamped to `[0, 1]`) of the remaining angle.
pub fn turn_toward(current: Real, target: Real, rotate_speed: Real, dt: Real) -> Real {
    let t = (rotate_speed * dt).clamp(0.0, 1.0);
    let delta = wrap_angle(target - current);
    wrap_angle(current + delta * t)
}
