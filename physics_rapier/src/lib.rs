//! Rapier world setup: tagged static surfaces plus one dynamic character body.
#![forbid(unsafe_code)]

use rapier3d::prelude::*;

const GROUND_GROUP: Group = Group::GROUP_1;
const LADDER_GROUP: Group = Group::GROUP_2;
const CHARACTER_GROUP: Group = Group::GROUP_31;
const PROP_GROUP: Group = Group::GROUP_32;

/// Surface classification used by the character probes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceTag {
    Ground,
    Ladder,
}

impl SurfaceTag {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "ground" => Some(SurfaceTag::Ground),
            "ladder" => Some(SurfaceTag::Ladder),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SurfaceTag::Ground => "ground",
            SurfaceTag::Ladder => "ladder",
        }
    }

    fn group(self) -> Group {
        match self {
            SurfaceTag::Ground => GROUND_GROUP,
            SurfaceTag::Ladder => LADDER_GROUP,
        }
    }
}

/// Set of surface tags a query is allowed to hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceMask(Group);

impl SurfaceMask {
    pub const NONE: SurfaceMask = SurfaceMask(Group::NONE);
    pub const GROUND: SurfaceMask = SurfaceMask(GROUND_GROUP);
    pub const LADDER: SurfaceMask = SurfaceMask(LADDER_GROUP);

    pub fn with(self, tag: SurfaceTag) -> Self {
        SurfaceMask(self.0 | tag.group())
    }

    pub fn contains(self, tag: SurfaceTag) -> bool {
        self.0.contains(tag.group())
    }

    pub fn is_empty(self) -> bool {
        self.0.is_empty()
    }

    /// Query filter groups: the query belongs everywhere and only accepts masked surfaces.
    pub fn query_groups(self) -> InteractionGroups {
        InteractionGroups::new(Group::ALL, self.0)
    }
}

impl From<SurfaceTag> for SurfaceMask {
    fn from(tag: SurfaceTag) -> Self {
        SurfaceMask(tag.group())
    }
}

fn surface_groups(tags: &[SurfaceTag]) -> InteractionGroups {
    let memberships = if tags.is_empty() {
        PROP_GROUP
    } else {
        tags.iter()
            .fold(Group::NONE, |groups, tag| groups | tag.group())
    };
    InteractionGroups::new(memberships, Group::ALL)
}

pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl PhysicsWorld {
    pub fn new(gravity: Vector<Real>) -> Self {
        Self {
            gravity,
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    pub fn bodies(&self) -> &RigidBodySet {
        &self.bodies
    }

    pub fn colliders(&self) -> &ColliderSet {
        &self.colliders
    }

    pub fn query_pipeline(&self) -> &QueryPipeline {
        &self.query_pipeline
    }

    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    pub fn step(&mut self, dt: Real) {
        self.integration_parameters.dt = dt;
        let physics_hooks = ();
        let event_handler = ();
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &physics_hooks,
            &event_handler,
        );
        self.query_pipeline.update(&self.colliders);
    }

    /// Rebuilds the query acceleration structure without stepping.
    pub fn refresh_queries(&mut self) {
        self.query_pipeline.update(&self.colliders);
    }

    /// Inserts a static collider carrying `tags`; untagged colliders still block
    /// movement but never satisfy a surface probe.
    pub fn insert_surface(&mut self, collider: Collider, tags: &[SurfaceTag]) -> ColliderHandle {
        let mut collider = collider;
        collider.set_collision_groups(surface_groups(tags));
        self.colliders.insert(collider)
    }

    /// Inserts the dynamic character body. Rotation is locked; heading is
    /// written explicitly by the controller.
    pub fn insert_character(
        &mut self,
        position: Vector<Real>,
        collider: Collider,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(position)
            .lock_rotations()
            .can_sleep(false)
            .build();
        let handle = self.bodies.insert(body);
        let mut collider = collider;
        collider.set_collision_groups(InteractionGroups::new(CHARACTER_GROUP, Group::ALL));
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        handle
    }
}
