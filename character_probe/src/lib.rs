//! Ground and ladder probes over tagged surfaces.
//!
//! Probes are pure queries. A miss is never an error: degenerate directions and
//! distances simply report "no hit".
#![forbid(unsafe_code)]

use physics_rapier::{PhysicsWorld, SurfaceMask};
use rapier3d::math::{Isometry, Point, Vector};
use rapier3d::prelude::{Cuboid, QueryFilter, Ray, Real};

const MIN_DIRECTION_LEN2: Real = 1.0e-8;

/// Spatial queries the probes and the camera rig need from a physics world.
pub trait SpatialQuery {
    /// True iff an axis-aligned box at `center` overlaps any masked surface.
    fn overlap_box(
        &self,
        center: Vector<Real>,
        half_extents: Vector<Real>,
        mask: SurfaceMask,
    ) -> bool;

    /// Distance along `dir` to the first masked surface boundary, if any.
    /// `dir` must be unit length.
    fn cast_ray(
        &self,
        origin: Vector<Real>,
        dir: Vector<Real>,
        max_toi: Real,
        mask: SurfaceMask,
    ) -> Option<Real>;
}

impl SpatialQuery for PhysicsWorld {
    fn overlap_box(
        &self,
        center: Vector<Real>,
        half_extents: Vector<Real>,
        mask: SurfaceMask,
    ) -> bool {
        if mask.is_empty() {
            return false;
        }
        let shape = Cuboid::new(half_extents);
        let shape_pos = Isometry::translation(center.x, center.y, center.z);
        self.query_pipeline()
            .intersection_with_shape(
                self.bodies(),
                self.colliders(),
                &shape_pos,
                &shape,
                QueryFilter::default().groups(mask.query_groups()),
            )
            .is_some()
    }

    fn cast_ray(
        &self,
        origin: Vector<Real>,
        dir: Vector<Real>,
        max_toi: Real,
        mask: SurfaceMask,
    ) -> Option<Real> {
        if mask.is_empty() {
            return None;
        }
        let ray = Ray::new(Point::from(origin), dir);
        // Non-solid casts report the exit boundary when the origin is already inside.
        self.query_pipeline()
            .cast_ray(
                self.bodies(),
                self.colliders(),
                &ray,
                max_toi,
                false,
                QueryFilter::default().groups(mask.query_groups()),
            )
            .map(|(_, toi)| toi)
    }
}

pub fn probe_ground<Q: SpatialQuery + ?Sized>(
    query: &Q,
    feet_anchor: Vector<Real>,
    extents: Vector<Real>,
    ground_mask: SurfaceMask,
) -> bool {
    if !is_finite(feet_anchor) || !is_finite(extents) {
        return false;
    }
    query.overlap_box(feet_anchor, extents.abs(), ground_mask)
}

pub fn probe_ladder<Q: SpatialQuery + ?Sized>(
    query: &Q,
    anchor: Vector<Real>,
    direction: Vector<Real>,
    max_distance: Real,
    ladder_mask: SurfaceMask,
) -> bool {
    if !is_finite(anchor) || !is_finite(direction) {
        return false;
    }
    if direction.norm_squared() <= MIN_DIRECTION_LEN2 {
        return false;
    }
    if max_distance.is_nan() || max_distance <= 0.0 {
        return false;
    }
    query
        .cast_ray(anchor, direction.normalize(), max_distance, ladder_mask)
        .is_some()
}

/// Probe anchors and extents, expressed in the character frame (-Z forward, +X right).
#[derive(Clone, Copy, Debug)]
pub struct ProbeProfile {
    pub feet_offset: Vector<Real>,
    pub ground_half_extents: Vector<Real>,
    /// Extra drop of the overlap box below the feet anchor.
    pub ground_check_distance: Real,
    pub ladder_offset: Vector<Real>,
    pub ladder_check_distance: Real,
    pub ground_mask: SurfaceMask,
    pub ladder_mask: SurfaceMask,
}

impl Default for ProbeProfile {
    fn default() -> Self {
        Self {
            feet_offset: Vector::new(0.0, -0.9, 0.0),
            ground_half_extents: Vector::new(0.25, 0.5, 0.25),
            ground_check_distance: 0.0,
            ladder_offset: Vector::new(0.0, 0.0, 0.0),
            ladder_check_distance: 0.8,
            ground_mask: SurfaceMask::GROUND,
            ladder_mask: SurfaceMask::LADDER,
        }
    }
}

impl ProbeProfile {
    pub fn feet_anchor(&self, position: Vector<Real>, heading: Real) -> Vector<Real> {
        position + rotate_by_heading(self.feet_offset, heading)
            - Vector::y() * self.ground_check_distance
    }

    pub fn ladder_anchor(&self, position: Vector<Real>, heading: Real) -> Vector<Real> {
        position + rotate_by_heading(self.ladder_offset, heading)
    }

    pub fn ground<Q: SpatialQuery + ?Sized>(
        &self,
        query: &Q,
        position: Vector<Real>,
        heading: Real,
    ) -> bool {
        probe_ground(
            query,
            self.feet_anchor(position, heading),
            self.ground_half_extents,
            self.ground_mask,
        )
    }

    pub fn ladder<Q: SpatialQuery + ?Sized>(
        &self,
        query: &Q,
        position: Vector<Real>,
        heading: Real,
        direction: Vector<Real>,
    ) -> bool {
        probe_ladder(
            query,
            self.ladder_anchor(position, heading),
            direction,
            self.ladder_check_distance,
            self.ladder_mask,
        )
    }
}

fn rotate_by_heading(offset: Vector<Real>, heading: Real) -> Vector<Real> {
    let (sin, cos) = heading.sin_cos();
    Vector::new(
        offset.x * cos - offset.z * sin,
        offset.y,
        offset.x * sin + offset.z * cos,
    )
}

fn is_finite(value: Vector<Real>) -> bool {
    value.iter().all(|component| component.is_finite())
}
