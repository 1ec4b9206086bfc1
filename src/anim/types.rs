use super::{time, track::Track};
use ahash::{HashMap, HashMapExt};
use nalgebra_glm as glm;

/// Element of the scene hierarchy. A node may or may not be a bone. Names are
/// not required to be unique.
#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub transform: glm::Mat4,
    pub children: Vec<Node>,
}

impl Node {
    #[must_use]
    pub fn new(name: &str, transform: glm::Mat4) -> Self {
        Self {
            name: name.to_string(),
            transform,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Depth first search for the first node with the given name
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Self> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Number of nodes in this subtree including this one
    #[must_use]
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Self::count).sum::<usize>()
    }
}

/// Keyframe tracks for one node. The three tracks are independent and do not
/// need to share timestamps.
#[derive(Clone, Debug)]
pub struct NodeChannel {
    pub node_name: String,
    pub positions: Track<glm::Vec3>,
    pub rotations: Track<glm::Quat>,
    pub scales: Track<glm::Vec3>,
}

impl NodeChannel {
    /// Channel that holds a node still in the given pose
    #[must_use]
    pub fn constant(
        node_name: &str,
        position: glm::Vec3,
        rotation: glm::Quat,
        scale: glm::Vec3,
    ) -> Self {
        Self {
            node_name: node_name.to_string(),
            positions: Track::constant(position),
            rotations: Track::constant(rotation),
            scales: Track::constant(scale),
        }
    }

    /// Latest keyframe time of the three tracks
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.positions
            .end_time()
            .max(self.rotations.end_time())
            .max(self.scales.end_time())
    }
}

#[derive(Clone, Debug)]
pub struct Animation {
    pub name: String,
    /// Length in ticks
    pub duration: f32,
    /// Zero means unspecified
    pub ticks_per_second: f32,
    /// Keyed by node name
    pub channels: HashMap<String, NodeChannel>,
}

impl Animation {
    #[must_use]
    pub fn new(name: &str, duration: f32, ticks_per_second: f32) -> Self {
        Self {
            name: name.to_string(),
            duration,
            ticks_per_second,
            channels: HashMap::new(),
        }
    }

    /// Adds a channel, replacing any existing channel for the same node
    pub fn insert(&mut self, channel: NodeChannel) {
        self.channels.insert(channel.node_name.clone(), channel);
    }

    #[must_use]
    pub fn channel(&self, node_name: &str) -> Option<&NodeChannel> {
        self.channels.get(node_name)
    }

    /// Ticks per second with the default substituted for a missing rate
    #[must_use]
    pub fn rate(&self) -> f32 {
        time::ticks_per_second(self.ticks_per_second)
    }

    /// Converts elapsed seconds into a looping tick value for this animation
    #[must_use]
    pub fn ticks(&self, seconds: f32) -> f32 {
        time::normalize(seconds, self.ticks_per_second, self.duration)
    }
}

/// One influence of a bone on a vertex
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VertexWeight {
    pub vertex: u32,
    pub weight: f32,
}

#[derive(Clone, Debug)]
pub struct MeshBone {
    pub name: String,
    /// Transforms from mesh space in the bind pose to bone space
    pub offset: glm::Mat4,
    pub weights: Vec<VertexWeight>,
}

impl MeshBone {
    #[must_use]
    pub fn new(name: &str, offset: glm::Mat4) -> Self {
        Self {
            name: name.to_string(),
            offset,
            weights: Vec::new(),
        }
    }
}

/// The bone list of one mesh part. Several parts may share a skeleton so the
/// same bone name can appear in more than one list.
#[derive(Clone, Debug, Default)]
pub struct MeshBones {
    pub name: String,
    pub vertex_count: usize,
    pub bones: Vec<MeshBone>,
}

/// Everything the evaluator needs from a loaded model
#[derive(Clone, Debug)]
pub struct Scene {
    pub root: Node,
    pub animations: Vec<Animation>,
    pub meshes: Vec<MeshBones>,
}

impl Scene {
    #[must_use]
    pub const fn new(root: Node) -> Self {
        Self {
            root,
            animations: Vec::new(),
            meshes: Vec::new(),
        }
    }
}
