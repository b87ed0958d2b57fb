//! Rigid-body seam
//!
//! Controllers talk to the physics engine only through [`PhysicsBackend`].
//! [`RapierPhysics`] implements it on top of rapier3d, compiled with
//! `enhanced-determinism`: with a fixed dt and handles iterated in order, a
//! replay produces the same bodies on the same platform.

use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude::*;
use serde::{Deserialize, Serialize};

use crate::consts::GRAVITY;

/// Opaque handle to a body owned by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// How the backend treats a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyType {
    /// Immovable; collides but ignores velocity and impulses
    Fixed,
    /// Fully simulated
    Dynamic,
    /// Moved only by explicit translation writes
    Kinematic,
}

/// Collision shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Cuboid { half_extents: Vec3 },
    Ball { radius: f32 },
    /// Upright capsule; total half height is `half_height + radius`
    Capsule { half_height: f32, radius: f32 },
}

/// Which rotations the solver may apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RotationLock {
    #[default]
    Free,
    /// Spin about Y only
    YawOnly,
    Locked,
}

/// Everything needed to create a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyDesc {
    pub body_type: BodyType,
    pub shape: Shape,
    pub translation: Vec3,
    pub rotation: Quat,
    pub linvel: Vec3,
    pub mass: f32,
    pub gravity_scale: f32,
    pub linear_damping: f32,
    pub restitution: f32,
    pub friction: f32,
    pub rotation_lock: RotationLock,
}

impl BodyDesc {
    pub fn new(body_type: BodyType, shape: Shape, translation: Vec3) -> Self {
        Self {
            body_type,
            shape,
            translation,
            rotation: Quat::IDENTITY,
            linvel: Vec3::ZERO,
            mass: 1.0,
            gravity_scale: 1.0,
            linear_damping: 0.0,
            restitution: 0.0,
            friction: 0.5,
            rotation_lock: RotationLock::Free,
        }
    }

    pub fn fixed(shape: Shape, translation: Vec3) -> Self {
        Self::new(BodyType::Fixed, shape, translation)
    }

    pub fn dynamic(shape: Shape, translation: Vec3) -> Self {
        Self::new(BodyType::Dynamic, shape, translation)
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_linvel(mut self, linvel: Vec3) -> Self {
        self.linvel = linvel;
        self
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn with_linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_rotation_lock(mut self, lock: RotationLock) -> Self {
        self.rotation_lock = lock;
        self
    }
}

/// Per-body operations the controllers rely on.
///
/// Getters return `None` for unknown handles; setters on unknown handles are
/// ignored. Controllers treat a missing body as "skip this frame".
pub trait PhysicsBackend {
    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle;
    fn remove_body(&mut self, handle: BodyHandle);
    fn contains(&self, handle: BodyHandle) -> bool;

    fn translation(&self, handle: BodyHandle) -> Option<Vec3>;
    fn set_translation(&mut self, handle: BodyHandle, translation: Vec3);
    fn rotation(&self, handle: BodyHandle) -> Option<Quat>;
    fn set_rotation(&mut self, handle: BodyHandle, rotation: Quat);
    fn linvel(&self, handle: BodyHandle) -> Option<Vec3>;
    fn set_linvel(&mut self, handle: BodyHandle, linvel: Vec3);
    /// One-shot momentum change; only dynamic bodies respond
    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3);

    fn body_type(&self, handle: BodyHandle) -> Option<BodyType>;
    fn set_body_type(&mut self, handle: BodyHandle, body_type: BodyType);
    fn set_mass(&mut self, handle: BodyHandle, mass: f32);

    /// Advance the simulation
    fn step(&mut self, dt: f32);
}

fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_rotation(q: Quat) -> Rotation<Real> {
    let q = q.normalize();
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

fn from_rotation(q: &Rotation<Real>) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

fn rapier_body_type(body_type: BodyType) -> RigidBodyType {
    match body_type {
        BodyType::Fixed => RigidBodyType::Fixed,
        BodyType::Dynamic => RigidBodyType::Dynamic,
        BodyType::Kinematic => RigidBodyType::KinematicPositionBased,
    }
}

/// One body, one collider
#[derive(Debug, Clone, Copy)]
struct Entry {
    body: RigidBodyHandle,
    collider: ColliderHandle,
}

/// rapier3d pipeline plus the handle table mapping [`BodyHandle`]s onto it
pub struct RapierPhysics {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    entries: BTreeMap<BodyHandle, Entry>,
    next_handle: u32,
}

impl Default for RapierPhysics {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, GRAVITY, 0.0))
    }
}

impl RapierPhysics {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: to_vector(gravity),
            integration_params: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            entries: BTreeMap::new(),
            next_handle: 1,
        }
    }

    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        let entry = self.entries.get(&handle)?;
        self.rigid_body_set.get(entry.body)
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        let entry = self.entries.get(&handle)?;
        self.rigid_body_set.get_mut(entry.body)
    }

    /// Refresh mass and inertia so impulses in the same frame see the change
    fn refresh_mass(&mut self, handle: BodyHandle) {
        let Some(entry) = self.entries.get(&handle).copied() else {
            return;
        };
        if let Some(body) = self.rigid_body_set.get_mut(entry.body) {
            body.recompute_mass_properties_from_colliders(&self.collider_set);
        }
    }
}

impl PhysicsBackend for RapierPhysics {
    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let mut builder = RigidBodyBuilder::new(rapier_body_type(desc.body_type))
            .translation(to_vector(desc.translation))
            .linvel(to_vector(desc.linvel))
            .gravity_scale(desc.gravity_scale)
            .linear_damping(desc.linear_damping);
        builder = match desc.rotation_lock {
            RotationLock::Free => builder,
            RotationLock::YawOnly => builder.enabled_rotations(false, true, false),
            RotationLock::Locked => builder.lock_rotations(),
        };
        let mut rigid_body = builder.build();
        rigid_body.set_rotation(to_rotation(desc.rotation), false);
        let body = self.rigid_body_set.insert(rigid_body);

        let collider = match desc.shape {
            Shape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            Shape::Ball { radius } => ColliderBuilder::ball(radius),
            Shape::Capsule { half_height, radius } => ColliderBuilder::capsule_y(half_height, radius),
        }
        .mass(desc.mass)
        .restitution(desc.restitution)
        .friction(desc.friction)
        .build();
        let collider =
            self.collider_set
                .insert_with_parent(collider, body, &mut self.rigid_body_set);

        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.insert(handle, Entry { body, collider });
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) {
        if let Some(entry) = self.entries.remove(&handle) {
            self.rigid_body_set.remove(
                entry.body,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            );
        }
    }

    fn contains(&self, handle: BodyHandle) -> bool {
        self.body(handle).is_some()
    }

    fn translation(&self, handle: BodyHandle) -> Option<Vec3> {
        self.body(handle).map(|b| from_vector(b.translation()))
    }

    fn set_translation(&mut self, handle: BodyHandle, translation: Vec3) {
        if let Some(b) = self.body_mut(handle) {
            b.set_translation(to_vector(translation), true);
        }
    }

    fn rotation(&self, handle: BodyHandle) -> Option<Quat> {
        self.body(handle).map(|b| from_rotation(b.rotation()))
    }

    fn set_rotation(&mut self, handle: BodyHandle, rotation: Quat) {
        if let Some(b) = self.body_mut(handle) {
            b.set_rotation(to_rotation(rotation), true);
        }
    }

    fn linvel(&self, handle: BodyHandle) -> Option<Vec3> {
        self.body(handle).map(|b| from_vector(b.linvel()))
    }

    fn set_linvel(&mut self, handle: BodyHandle, linvel: Vec3) {
        if let Some(b) = self.body_mut(handle) {
            if b.is_dynamic() {
                b.set_linvel(to_vector(linvel), true);
            }
        }
    }

    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3) {
        if let Some(b) = self.body_mut(handle) {
            b.apply_impulse(to_vector(impulse), true);
        }
    }

    fn body_type(&self, handle: BodyHandle) -> Option<BodyType> {
        self.body(handle).map(|b| match b.body_type() {
            RigidBodyType::Fixed => BodyType::Fixed,
            RigidBodyType::Dynamic => BodyType::Dynamic,
            RigidBodyType::KinematicPositionBased | RigidBodyType::KinematicVelocityBased => {
                BodyType::Kinematic
            }
        })
    }

    fn set_body_type(&mut self, handle: BodyHandle, body_type: BodyType) {
        if let Some(b) = self.body_mut(handle) {
            if body_type != BodyType::Dynamic {
                b.set_linvel(vector![0.0, 0.0, 0.0], false);
            }
            b.set_body_type(rapier_body_type(body_type), true);
        }
        self.refresh_mass(handle);
    }

    fn set_mass(&mut self, handle: BodyHandle, mass: f32) {
        let Some(entry) = self.entries.get(&handle).copied() else {
            return;
        };
        if let Some(collider) = self.collider_set.get_mut(entry.collider) {
            collider.set_mass(mass.max(0.0));
        }
        self.refresh_mass(handle);
    }

    fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.integration_params.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }
}
