use super::{
    influence::{self, VertexBones},
    registry::BoneRegistry,
    types::{Animation, Node, NodeChannel, Scene},
};
use crate::{
    config::{PoseOptions, SamplePolicy},
    dualquat::{self, DualQuat},
    rz_error::RzError,
    types::{BoneMatrix, MatrixLayout},
};
use log::{debug, info, trace};
use nalgebra_glm as glm;

/// Owns a loaded scene together with everything needed to pose its bones:
/// the bone registry, the inverse of the root's bind transform, the active
/// animation and the output transforms.
#[derive(Clone, Debug)]
pub struct PoseEvaluator {
    scene: Scene,
    registry: BoneRegistry,
    global_inverse_root: glm::Mat4,
    animation_index: Option<usize>,
    sample_policy: SamplePolicy,
    matrix_layout: MatrixLayout,
    /// Published result of the last complete evaluation
    transforms: Vec<glm::Mat4>,
    /// Filled during evaluation then swapped with `transforms`
    back: Vec<glm::Mat4>,
}

impl PoseEvaluator {
    /// Builds the bone registry from the scene's mesh bone lists and prepares
    /// the output buffers. Bone indices follow mesh order then bone order.
    ///
    /// # Errors
    /// Returns `RzError::CapacityExceeded` if the scene has more bones than
    /// `options.max_bones`, `RzError::SingularRoot` if the root transform
    /// cannot be inverted, or `RzError::AnimationNotFound` if the scene has
    /// animations but not the one requested.
    pub fn new(scene: Scene, options: &PoseOptions) -> Result<Self, RzError> {
        let mut registry = BoneRegistry::new(options.max_bones);
        for mesh in &scene.meshes {
            registry.register_mesh(mesh)?;
        }

        let global_inverse_root = scene
            .root
            .transform
            .try_inverse()
            .ok_or(RzError::SingularRoot)?;

        let animation_index = if scene.animations.is_empty() {
            None
        } else if options.animation_index < scene.animations.len() {
            Some(options.animation_index)
        } else {
            return Err(RzError::AnimationNotFound(options.animation_index));
        };

        info!(
            "pose evaluator: {} nodes, {} bones, {} animations, active={:?}",
            scene.root.count(),
            registry.len(),
            scene.animations.len(),
            animation_index
        );

        let bone_count = registry.len();
        Ok(Self {
            scene,
            registry,
            global_inverse_root,
            animation_index,
            sample_policy: options.sample_policy,
            matrix_layout: options.matrix_layout,
            transforms: vec![glm::Mat4::identity(); bone_count],
            back: vec![glm::Mat4::identity(); bone_count],
        })
    }

    #[must_use]
    pub const fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub const fn registry(&self) -> &BoneRegistry {
        &self.registry
    }

    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub const fn global_inverse_root(&self) -> &glm::Mat4 {
        &self.global_inverse_root
    }

    /// The animation that `evaluate` plays, if the scene has any
    #[must_use]
    pub fn animation(&self) -> Option<&Animation> {
        self.animation_index.map(|i| &self.scene.animations[i])
    }

    /// Switches the active animation
    ///
    /// # Errors
    /// Returns `RzError::AnimationNotFound` for an invalid index.
    pub fn select_animation(&mut self, index: usize) -> Result<(), RzError> {
        if index >= self.scene.animations.len() {
            return Err(RzError::AnimationNotFound(index));
        }
        debug!(
            "active animation {} {:?}",
            index, self.scene.animations[index].name
        );
        self.animation_index = Some(index);
        Ok(())
    }

    /// Converts elapsed seconds to ticks of the active animation. Always 0
    /// when there is no animation.
    #[must_use]
    pub fn ticks(&self, seconds: f32) -> f32 {
        self.animation().map_or(0.0, |a| a.ticks(seconds))
    }

    /// Poses every bone at `ticks` of the active animation. Nodes without a
    /// channel, or every node if there is no animation, use their fixed
    /// transform.
    ///
    /// The result only replaces the previous pose once the whole tree has
    /// been walked. On error the previous pose is kept.
    ///
    /// # Errors
    /// With `SamplePolicy::Strict` returns `RzError::OutOfRange` if `ticks`
    /// is outside of the keyframes of any channel track.
    pub fn evaluate(&mut self, ticks: f32) -> Result<&[glm::Mat4], RzError> {
        trace!("evaluate ticks={}", ticks);
        let mut back = std::mem::take(&mut self.back);
        back.clear();
        back.resize(self.registry.len(), glm::Mat4::identity());

        let walk = Walk {
            registry: &self.registry,
            animation: self.animation(),
            global_inverse_root: &self.global_inverse_root,
            policy: self.sample_policy,
            ticks,
        };
        let result = walk.traverse(&self.scene.root, &glm::Mat4::identity(), &mut back);

        match result {
            Ok(()) => {
                self.back = std::mem::replace(&mut self.transforms, back);
                Ok(&self.transforms)
            }
            Err(e) => {
                self.back = back;
                Err(e)
            }
        }
    }

    /// Poses every bone at a wall clock time, looping the active animation
    ///
    /// # Errors
    /// See `evaluate`
    pub fn evaluate_seconds(
        &mut self,
        seconds: f32,
    ) -> Result<&[glm::Mat4], RzError> {
        let ticks = self.ticks(seconds);
        self.evaluate(ticks)
    }

    /// Final bone transforms from the last evaluation, indexed by bone
    /// index. Identity until the first evaluation.
    #[must_use]
    pub fn transforms(&self) -> &[glm::Mat4] {
        &self.transforms
    }

    /// Final transform of a bone by name
    #[must_use]
    pub fn transform(&self, bone_name: &str) -> Option<&glm::Mat4> {
        self.registry
            .index(bone_name)
            .and_then(|i| self.transforms.get(i))
    }

    /// Bone matrices in the configured layout, ready for upload
    #[must_use]
    pub fn bone_matrices(&self) -> Vec<BoneMatrix> {
        self.transforms
            .iter()
            .map(|m| BoneMatrix::new(m, self.matrix_layout))
            .collect()
    }

    /// Writes bone matrices into a uniform buffer sized for the shader.
    /// Entries of `output` past the bone count are left alone.
    ///
    /// # Errors
    /// Returns `RzError::CapacityExceeded` if `output` is too short to hold
    /// every bone. Nothing is written in that case.
    pub fn write_bone_matrices(
        &self,
        output: &mut [BoneMatrix],
    ) -> Result<(), RzError> {
        if output.len() < self.transforms.len() {
            return Err(RzError::CapacityExceeded {
                count: self.transforms.len(),
                max: output.len(),
            });
        }
        for (out, m) in output.iter_mut().zip(&self.transforms) {
            *out = BoneMatrix::new(m, self.matrix_layout);
        }
        Ok(())
    }

    /// Bone transforms as unit dual quaternions for dual quaternion skinning.
    /// Only rotation and translation are kept.
    #[must_use]
    pub fn dual_quats(&self) -> Vec<DualQuat> {
        self.transforms.iter().map(dualquat::from_mat4).collect()
    }

    /// Bone id and weight stream for one of the scene's mesh parts
    ///
    /// # Errors
    /// Returns `RzError::MeshNotFound` for an invalid index, otherwise see
    /// `influence::vertex_bones`.
    pub fn vertex_bones(
        &self,
        mesh_index: usize,
    ) -> Result<Vec<VertexBones>, RzError> {
        let mesh = self
            .scene
            .meshes
            .get(mesh_index)
            .ok_or(RzError::MeshNotFound(mesh_index))?;
        influence::vertex_bones(mesh, &self.registry)
    }
}

/// Per evaluation state for the recursive walk
struct Walk<'a> {
    registry: &'a BoneRegistry,
    animation: Option<&'a Animation>,
    global_inverse_root: &'a glm::Mat4,
    policy: SamplePolicy,
    ticks: f32,
}

impl Walk<'_> {
    /// Local transform from the node's channel
    fn animated(&self, channel: &NodeChannel) -> Result<glm::Mat4, RzError> {
        let (pos, rot, scl) = match self.policy {
            SamplePolicy::Clamp => (
                channel.positions.sample_clamped(self.ticks),
                channel.rotations.sample_clamped(self.ticks),
                channel.scales.sample_clamped(self.ticks),
            ),
            SamplePolicy::Strict => (
                channel.positions.sample(self.ticks)?,
                channel.rotations.sample(self.ticks)?,
                channel.scales.sample(self.ticks)?,
            ),
        };
        Ok(glm::translation(&pos) * glm::quat_to_mat4(&rot) * glm::scaling(&scl))
    }

    /// Call with the root node to recursively calculate global transforms,
    /// writing bone transforms to `output` as they are found. Pre-order, so
    /// with duplicate bone names the last node visited wins.
    fn traverse(
        &self,
        node: &Node,
        parent: &glm::Mat4,
        output: &mut [glm::Mat4],
    ) -> Result<(), RzError> {
        let local = match self.animation.and_then(|a| a.channel(&node.name)) {
            Some(channel) => self.animated(channel)?,
            None => node.transform,
        };
        let global = parent * local;

        if let Some(index) = self.registry.index(&node.name) {
            if let (Some(out), Some(offset)) =
                (output.get_mut(index), self.registry.offset(index))
            {
                *out = self.global_inverse_root * global * offset;
            }
        }

        for child in &node.children {
            self.traverse(child, &global, output)?;
        }
        Ok(())
    }
}
