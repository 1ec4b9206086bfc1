use std::{error, fmt};

/// Unified error type
///
/// Errors from the importer and from the crates it depends on are converted
/// with `From` so they can be propagated with `?`. Some of those error types
/// are large so are boxed.
#[derive(Debug)]
pub enum RzError {
    /// Sample time outside of the keyframe range of a track
    OutOfRange { time: f32, start: f32, end: f32 },
    /// More bones than the configured maximum
    CapacityExceeded { count: usize, max: usize },
    EmptyTrack,
    UnsortedTrack(usize),
    InvalidKeyTime(usize),
    SingularRoot,
    AnimationNotFound(usize),
    MeshNotFound(usize),
    VertexOutOfRange { vertex: u32, vertex_count: usize },
    BoneNotFound(String),
    StdIoError(std::io::Error),
    SerdeYamlError(Box<serde_yaml::Error>),
    GltfError(Box<gltf::Error>),
    ImportError(crate::scene_import::ImportError),
}

impl error::Error for RzError {}

impl fmt::Display for RzError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::OutOfRange { time, start, end } => {
                write!(f, "time {time} is outside of track range {start}..={end}")
            }
            Self::CapacityExceeded { count, max } => {
                write!(f, "bone count {count} exceeds maximum of {max}")
            }
            Self::EmptyTrack => write!(f, "track has no keyframes"),
            Self::UnsortedTrack(a) => {
                write!(f, "keyframe {a} is earlier than the one before it")
            }
            Self::InvalidKeyTime(a) => {
                write!(f, "keyframe {a} does not have a finite time")
            }
            Self::SingularRoot => {
                write!(f, "root node transform is not invertible")
            }
            Self::AnimationNotFound(a) => write!(f, "animation {a} not found"),
            Self::MeshNotFound(a) => write!(f, "mesh {a} not found"),
            Self::VertexOutOfRange {
                vertex,
                vertex_count,
            } => {
                write!(f, "vertex {vertex} out of range for {vertex_count} vertices")
            }
            Self::BoneNotFound(name) => write!(f, "bone {name:?} not registered"),
            Self::StdIoError(e) => write!(f, "std::io::Error: {}", e.kind()),
            Self::SerdeYamlError(e) => {
                write!(f, "serde_yaml::Error: {e}")
            }
            Self::GltfError(e) => {
                write!(f, "gltf Error: {e}")
            }
            Self::ImportError(e) => write!(f, "import error: {e}"),
        }
    }
}

impl From<std::io::Error> for RzError {
    fn from(e: std::io::Error) -> Self {
        Self::StdIoError(e)
    }
}

impl From<serde_yaml::Error> for RzError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::SerdeYamlError(Box::new(e))
    }
}

impl From<gltf::Error> for RzError {
    fn from(e: gltf::Error) -> Self {
        Self::GltfError(Box::new(e))
    }
}

impl From<crate::scene_import::ImportError> for RzError {
    fn from(e: crate::scene_import::ImportError) -> Self {
        Self::ImportError(e)
    }
}
