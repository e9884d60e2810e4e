//! Orbiting follow camera with collision pull-in.
#![forbid(unsafe_code)]

use character_probe::SpatialQuery;
use physics_rapier::SurfaceMask;
use rapier3d::math::Vector;
use rapier3d::prelude::Real;

#[derive(Clone, Copy, Debug)]
pub struct OrbitCameraConfig {
    /// Radians of rotation per unit of orbit input per second.
    pub sensitivity: Real,
    pub distance: Real,
    /// Pitch limits in radians; positive pitch looks down at the target.
    pub min_pitch: Real,
    pub max_pitch: Real,
    /// Gap kept between the eye and an occluding surface.
    pub pull_in_margin: Real,
    pub obstacle_mask: SurfaceMask,
}

impl Default for OrbitCameraConfig {
    fn default() -> Self {
        Self {
            sensitivity: 3.0,
            distance: 5.0,
            min_pitch: -0.6,
            max_pitch: 1.2,
            pull_in_margin: 0.5,
            obstacle_mask: SurfaceMask::GROUND,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CameraPose {
    pub eye: Vector<Real>,
    pub target: Vector<Real>,
    pub yaw: Real,
    pub pitch: Real,
    /// Eye-to-target distance after pull-in.
    pub distance: Real,
    pub pulled_in: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct OrbitCamera {
    config: OrbitCameraConfig,
    yaw: Real,
    pitch: Real,
    eye: Vector<Real>,
    target: Vector<Real>,
    distance: Real,
    pulled_in: bool,
}

impl OrbitCamera {
    pub fn new(config: OrbitCameraConfig) -> Self {
        let mut camera = Self {
            config,
            yaw: 0.0,
            pitch: 0.0,
            eye: Vector::zeros(),
            target: Vector::zeros(),
            distance: config.distance,
            pulled_in: false,
        };
        camera.pitch = camera.clamp_pitch(0.0);
        camera
    }

    pub fn config(&self) -> &OrbitCameraConfig {
        &self.config
    }

    pub fn yaw(&self) -> Real {
        self.yaw
    }

    pub fn pitch(&self) -> Real {
        self.pitch
    }

    pub fn set_look(&mut self, yaw: Real, pitch: Real) {
        self.yaw = yaw;
        self.pitch = self.clamp_pitch(pitch);
    }

    /// Applies one tick of orbit input. Positive `dy` tilts the view up.
    pub fn apply_orbit_delta(&mut self, delta: [Real; 2], dt: Real) {
        let scale = self.config.sensitivity * dt.max(0.0);
        self.yaw += delta[0] * scale;
        self.pitch = self.clamp_pitch(self.pitch - delta[1] * scale);
    }

    pub fn forward(&self) -> Vector<Real> {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vector::new(sin_yaw * cos_pitch, -sin_pitch, -cos_yaw * cos_pitch)
    }

    /// Horizontal `(forward, right)` unit vectors of the current view.
    pub fn planar_basis(&self) -> (Vector<Real>, Vector<Real>) {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        (
            Vector::new(sin_yaw, 0.0, -cos_yaw),
            Vector::new(cos_yaw, 0.0, sin_yaw),
        )
    }

    pub fn update_from_target<Q: SpatialQuery + ?Sized>(
        &mut self,
        target: Vector<Real>,
        query: &Q,
    ) -> CameraPose {
        let forward = self.forward();
        let distance = self.config.distance.max(0.0);
        let desired_eye = target - forward * distance;
        let hit = if distance > 0.0 {
            query.cast_ray(desired_eye, forward, distance, self.config.obstacle_mask)
        } else {
            None
        };
        self.target = target;
        match hit {
            Some(toi) => {
                let pulled = (distance - toi - self.config.pull_in_margin).max(0.0);
                self.eye = target - forward * pulled;
                self.distance = pulled;
                self.pulled_in = true;
            }
            None => {
                self.eye = desired_eye;
                self.distance = distance;
                self.pulled_in = false;
            }
        }
        self.pose()
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            eye: self.eye,
            target: self.target,
            yaw: self.yaw,
            pitch: self.pitch,
            distance: self.distance,
            pulled_in: self.pulled_in,
        }
    }

    fn clamp_pitch(&self, pitch: Real) -> Real {
        pitch.max(self.config.min_pitch).min(self.config.max_pitch)
    }
}
