use crate::rz_error::RzError;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct ImportOptions {
    /// Convert from glTF's +Y up to +Z up
    pub swizzle: bool,
    /// Keep skins that no mesh uses so their joints still get bone indices
    pub unused_skins: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            swizzle: false,
            unused_skins: true,
        }
    }
}

impl ImportOptions {
    /// Reads options from a YAML file
    ///
    /// # Errors
    /// May return `RzError`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RzError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }
}

/// Errors specific to importing data. `RzError` has a `From` trait to
/// handle these.
#[derive(Debug)]
pub enum ImportError {
    NoScene,
    EmptyScene(usize),
    SparseAnimation,
    NoSampler,
    NoSamplerOutput,
    CountMismatch { inputs: usize, outputs: usize },
    NoWeights,
    NoInverseBind(usize),
    BigJointIndex { joint: u16, joints: usize },
    BadTrack { node: usize, source: Box<RzError> },
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::NoScene => write!(f, "file contains no scene"),
            Self::EmptyScene(a) => write!(f, "scene {a} has no nodes"),
            Self::SparseAnimation => {
                write!(f, "sparse animation data is not supported")
            }
            Self::NoSampler => {
                write!(f, "a sampler input is required for animation")
            }
            Self::NoSamplerOutput => {
                write!(f, "a sampler output is required for animation")
            }
            Self::CountMismatch { inputs, outputs } => {
                write!(
                    f,
                    "{inputs} keyframe times do not match {outputs} values"
                )
            }
            Self::NoWeights => {
                write!(f, "vertex weights are required for a skinned mesh")
            }
            Self::NoInverseBind(a) => {
                write!(f, "skin {a} has too few inverse bind matrices")
            }
            Self::BigJointIndex { joint, joints } => {
                write!(f, "joint index {joint} out of range for {joints} joints")
            }
            Self::BadTrack { node, source } => {
                write!(f, "node {node} has an unusable track: {source}")
            }
        }
    }
}
