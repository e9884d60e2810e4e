use character_probe::SpatialQuery;
use engine_core::observability;
use physics_rapier::{PhysicsWorld, SurfaceMask};
use rapier3d::math::{Rotation, Vector};
use rapier3d::prelude::{Real, RigidBodyHandle};

use crate::{ControllerError, LOG_TARGET};

/// The velocity-settable dynamic body the controller drives.
pub trait CharacterBody {
    fn position(&self) -> Vector<Real>;
    fn velocity(&self) -> Vector<Real>;
    fn set_velocity(&mut self, velocity: Vector<Real>);
    fn apply_impulse(&mut self, impulse: Vector<Real>);
    /// Yaw in radians; 0 faces -Z, positive turns toward +X.
    fn set_heading(&mut self, heading: Real);
}

/// A rapier character body together with the world it lives in.
pub struct RapierCharacter<'w> {
    world: &'w mut PhysicsWorld,
    handle: RigidBodyHandle,
}

impl<'w> RapierCharacter<'w> {
    /// Checks the body once up front; a missing or non-dynamic body is a fatal
    /// configuration error and is reported before it is returned.
    pub fn attach(
        world: &'w mut PhysicsWorld,
        handle: RigidBodyHandle,
    ) -> Result<Self, ControllerError> {
        let checked = match world.body(handle) {
            None => Err(ControllerError::MissingBody),
            Some(body) if !body.is_dynamic() => Err(ControllerError::BodyNotDynamic),
            Some(_) => Ok(()),
        };
        if let Err(err) = checked {
            observability::set_sticky_error(LOG_TARGET, err.to_string());
            return Err(err);
        }
        Ok(Self { world, handle })
    }

    /// Steps the borrowed world, so one attachment can live for a whole run.
    pub fn step(&mut self, dt: Real) {
        self.world.step(dt);
    }

    pub fn world(&self) -> &PhysicsWorld {
        &*self.world
    }

    pub fn handle(&self) -> RigidBodyHandle {
        self.handle
    }
}

impl CharacterBody for RapierCharacter<'_> {
    fn position(&self) -> Vector<Real> {
        self.world
            .body(self.handle)
            .map(|body| *body.translation())
            .unwrap_or_else(Vector::zeros)
    }

    fn velocity(&self) -> Vector<Real> {
        self.world
            .body(self.handle)
            .map(|body| *body.linvel())
            .unwrap_or_else(Vector::zeros)
    }

    fn set_velocity(&mut self, velocity: Vector<Real>) {
        if let Some(body) = self.world.body_mut(self.handle) {
            body.set_linvel(velocity, true);
        }
    }

    fn apply_impulse(&mut self, impulse: Vector<Real>) {
        if let Some(body) = self.world.body_mut(self.handle) {
            body.apply_impulse(impulse, true);
        }
    }

    fn set_heading(&mut self, heading: Real) {
        if let Some(body) = self.world.body_mut(self.handle) {
            body.set_rotation(Rotation::from_axis_angle(&Vector::y_axis(), -heading), true);
        }
    }
}

impl SpatialQuery for RapierCharacter<'_> {
    fn overlap_box(
        &self,
        center: Vector<Real>,
        half_extents: Vector<Real>,
        mask: SurfaceMask,
    ) -> bool {
        self.world.overlap_box(center, half_extents, mask)
    }

    fn cast_ray(
        &self,
        origin: Vector<Real>,
        dir: Vector<Real>,
        max_toi: Real,
        mask: SurfaceMask,
    ) -> Option<Real> {
        self.world.cast_ray(origin, dir, max_toi, mask)
    }
}
