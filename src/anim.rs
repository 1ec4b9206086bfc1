//! Skeletal animation: keyframe sampling, hierarchy composition and the bone
//! bookkeeping needed to feed a skinning shader.
pub mod influence;
pub mod pose;
pub mod registry;
pub mod shared;
pub mod time;
pub mod track;
pub mod types;

// Re-export types
pub use influence::{vertex_bones, VertexBones, MAX_INFLUENCES};
pub use pose::PoseEvaluator;
pub use registry::BoneRegistry;
pub use shared::SharedPose;
pub use time::AnimationClock;
pub use track::{Interpolate, Interpolation, Keyframe, Track};
pub use types::{
    Animation, MeshBone, MeshBones, Node, NodeChannel, Scene, VertexWeight,
};
