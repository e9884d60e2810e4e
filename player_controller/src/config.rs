//! Locomotion tunables, loaded from TOML.
//!
//! Every section and field is optional; missing values take the defaults below.

use std::path::Path;

use character_motor_tps::TpsMotorConfig;
use character_probe::ProbeProfile;
use physics_rapier::SurfaceMask;
use player_camera::OrbitCameraConfig;
use rapier3d::math::Vector;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    pub camera: CameraSection,
    pub movement: MovementSection,
    pub jump: JumpSection,
    pub probe: ProbeSection,
    pub climb: ClimbSection,
    pub roll: RollSection,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSection {
    pub sensitivity: f32,
    pub distance: f32,
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub pull_in_margin: f32,
}

impl Default for CameraSection {
    fn default() -> Self {
        let camera = OrbitCameraConfig::default();
        Self {
            sensitivity: camera.sensitivity,
            distance: camera.distance,
            min_pitch: camera.min_pitch,
            max_pitch: camera.max_pitch,
            pull_in_margin: camera.pull_in_margin,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementSection {
    pub walk_speed: f32,
    pub run_speed: f32,
    pub always_run: bool,
    pub rotate_speed: f32,
}

impl Default for MovementSection {
    fn default() -> Self {
        let motor = TpsMotorConfig::default();
        Self {
            walk_speed: motor.walk_speed,
            run_speed: motor.run_speed,
            always_run: motor.always_run,
            rotate_speed: motor.rotate_speed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpSection {
    pub impulse: f32,
}

impl Default for JumpSection {
    fn default() -> Self {
        Self { impulse: 5.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSection {
    pub feet_offset: [f32; 3],
    pub ground_half_extents: [f32; 3],
    pub ground_check_distance: f32,
    pub ladder_offset: [f32; 3],
    pub ladder_check_distance: f32,
}

impl Default for ProbeSection {
    fn default() -> Self {
        let profile = ProbeProfile::default();
        Self {
            feet_offset: to_array(profile.feet_offset),
            ground_half_extents: to_array(profile.ground_half_extents),
            ground_check_distance: profile.ground_check_distance,
            ladder_offset: to_array(profile.ladder_offset),
            ladder_check_distance: profile.ladder_check_distance,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimbSection {
    pub up_speed: f32,
    pub down_speed: f32,
}

impl Default for ClimbSection {
    fn default() -> Self {
        let motor = TpsMotorConfig::default();
        Self {
            up_speed: motor.climb_up_speed,
            down_speed: motor.climb_down_speed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollSection {
    pub duration: f32,
    pub cooldown: f32,
}

impl Default for RollSection {
    fn default() -> Self {
        Self {
            duration: 0.4,
            cooldown: 1.0,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ConfigValidation {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn require_non_negative(&mut self, name: &str, value: f32) {
        if !value.is_finite() || value < 0.0 {
            self.errors.push(format!("{} must be a finite value >= 0", name));
        }
    }

    fn require_finite_vector(&mut self, name: &str, value: [f32; 3]) {
        if !value.iter().all(|component| component.is_finite()) {
            self.errors.push(format!("{} must be finite", name));
        }
    }
}

impl LocomotionConfig {
    pub fn parse_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|err| err.to_string())
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| format!("read {} failed: {}", path.display(), err))?;
        Self::parse_toml(&text).map_err(|err| format!("parse {} failed: {}", path.display(), err))
    }

    pub fn validate(&self) -> ConfigValidation {
        let mut validation = ConfigValidation::default();
        validation.require_non_negative("camera.sensitivity", self.camera.sensitivity);
        validation.require_non_negative("camera.distance", self.camera.distance);
        validation.require_non_negative("camera.pull_in_margin", self.camera.pull_in_margin);
        if !self.camera.min_pitch.is_finite() || !self.camera.max_pitch.is_finite() {
            validation
                .errors
                .push("camera pitch limits must be finite".to_string());
        } else if self.camera.min_pitch > self.camera.max_pitch {
            validation
                .errors
                .push("camera.min_pitch must be <= camera.max_pitch".to_string());
        }
        validation.require_non_negative("movement.walk_speed", self.movement.walk_speed);
        validation.require_non_negative("movement.run_speed", self.movement.run_speed);
        validation.require_non_negative("movement.rotate_speed", self.movement.rotate_speed);
        validation.require_non_negative("jump.impulse", self.jump.impulse);
        validation.require_finite_vector("probe.feet_offset", self.probe.feet_offset);
        validation.require_finite_vector("probe.ladder_offset", self.probe.ladder_offset);
        validation
            .require_finite_vector("probe.ground_half_extents", self.probe.ground_half_extents);
        if self
            .probe
            .ground_half_extents
            .iter()
            .any(|extent| *extent <= 0.0)
        {
            validation
                .errors
                .push("probe.ground_half_extents must be > 0".to_string());
        }
        validation.require_non_negative(
            "probe.ground_check_distance",
            self.probe.ground_check_distance,
        );
        validation.require_non_negative(
            "probe.ladder_check_distance",
            self.probe.ladder_check_distance,
        );
        validation.require_non_negative("climb.up_speed", self.climb.up_speed);
        validation.require_non_negative("climb.down_speed", self.climb.down_speed);
        validation.require_non_negative("roll.duration", self.roll.duration);
        validation.require_non_negative("roll.cooldown", self.roll.cooldown);
        if self.roll.cooldown < self.roll.duration {
            validation.warnings.push(format!(
                "roll.cooldown ({}) is shorter than roll.duration ({}); using the duration",
                self.roll.cooldown, self.roll.duration
            ));
        }
        if self.movement.run_speed < self.movement.walk_speed {
            validation
                .warnings
                .push("movement.run_speed is slower than movement.walk_speed".to_string());
        }
        validation
    }

    /// Cooldown actually scheduled: never shorter than the roll itself, so a
    /// roll cannot become ready while still in progress.
    pub fn effective_roll_cooldown(&self) -> f32 {
        self.roll.cooldown.max(self.roll.duration)
    }

    pub fn camera_config(&self) -> OrbitCameraConfig {
        OrbitCameraConfig {
            sensitivity: self.camera.sensitivity,
            distance: self.camera.distance,
            min_pitch: self.camera.min_pitch,
            max_pitch: self.camera.max_pitch,
            pull_in_margin: self.camera.pull_in_margin,
            obstacle_mask: SurfaceMask::GROUND,
        }
    }

    pub fn motor_config(&self) -> TpsMotorConfig {
        TpsMotorConfig {
            walk_speed: self.movement.walk_speed,
            run_speed: self.movement.run_speed,
            always_run: self.movement.always_run,
            climb_up_speed: self.climb.up_speed,
            climb_down_speed: self.climb.down_speed,
            rotate_speed: self.movement.rotate_speed,
        }
    }

    pub fn probe_profile(&self) -> ProbeProfile {
        ProbeProfile {
            feet_offset: from_array(self.probe.feet_offset),
            ground_half_extents: from_array(self.probe.ground_half_extents),
            ground_check_distance: self.probe.ground_check_distance,
            ladder_offset: from_array(self.probe.ladder_offset),
            ladder_check_distance: self.probe.ladder_check_distance,
            ground_mask: SurfaceMask::GROUND,
            ladder_mask: SurfaceMask::LADDER,
        }
    }
}

fn to_array(value: Vector<f32>) -> [f32; 3] {
    [value.x, value.y, value.z]
}

fn from_array(value: [f32; 3]) -> Vector<f32> {
    Vector::new(value[0], value[1], value[2])
}
