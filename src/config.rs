use crate::{
    rz_error::RzError,
    types::{MatrixLayout, MAX_BONES},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// What to do when a sample time falls outside of a track's keyframes
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SamplePolicy {
    /// Clamp the time to the nearest keyframe
    #[default]
    Clamp,
    /// Fail the evaluation with `RzError::OutOfRange`
    Strict,
}

/// Options for building a `PoseEvaluator`
///
/// Every field has a default so a YAML file only needs to list the ones it
/// changes:
/// ```yaml
/// max_bones: 200
/// sample_policy: strict
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PoseOptions {
    /// Capacity of the bone uniform array
    pub max_bones: usize,
    /// Which animation of the scene to play
    pub animation_index: usize,
    pub sample_policy: SamplePolicy,
    pub matrix_layout: MatrixLayout,
}

impl Default for PoseOptions {
    fn default() -> Self {
        Self {
            max_bones: MAX_BONES,
            animation_index: 0,
            sample_policy: SamplePolicy::Clamp,
            matrix_layout: MatrixLayout::ColumnMajor,
        }
    }
}

impl PoseOptions {
    /// Parses options from YAML text
    ///
    /// # Errors
    /// May return `RzError`
    pub fn from_yaml(text: &str) -> Result<Self, RzError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Reads options from a YAML file
    ///
    /// # Errors
    /// May return `RzError`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RzError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Converts options to YAML text
    ///
    /// # Errors
    /// May return `RzError`
    pub fn to_yaml(&self) -> Result<String, RzError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml() {
        let options =
            PoseOptions::from_yaml("max_bones: 200\nsample_policy: strict\n")
                .unwrap();
        assert_eq!(options.max_bones, 200);
        assert_eq!(options.sample_policy, SamplePolicy::Strict);
        assert_eq!(options.animation_index, 0);
        assert_eq!(options.matrix_layout, MatrixLayout::ColumnMajor);
    }

    #[test]
    fn yaml_both_ways() {
        let options = PoseOptions {
            matrix_layout: MatrixLayout::RowMajor,
            animation_index: 2,
            ..Default::default()
        };
        let text = options.to_yaml().unwrap();
        assert_eq!(PoseOptions::from_yaml(&text).unwrap(), options);
    }

    #[test]
    fn bad_yaml() {
        assert!(matches!(
            PoseOptions::from_yaml("sample_policy: sometimes"),
            Err(RzError::SerdeYamlError(_))
        ));
    }
}
