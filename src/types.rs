use bytemuck::{Pod, Zeroable};
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

/// Default maximum bones for a skinned mesh. This has to match the size of
/// the uniform array in the skinning shader.
pub const MAX_BONES: usize = 100;

/// Ticks per second used when an animation does not specify a rate
pub const DEFAULT_TICKS_PER_SECOND: f32 = 25.0;

/// Memory layout of matrices sent to shaders
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum MatrixLayout {
    /// Each inner array is a column, as expected by GLSL and WGSL
    #[default]
    ColumnMajor,
    /// Each inner array is a row, as expected by HLSL without `column_major`
    RowMajor,
}

/// Shader ready bone matrix
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable, Pod)]
pub struct BoneMatrix(pub [[f32; 4]; 4]);

impl BoneMatrix {
    pub const IDENTITY: Self = Self([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    #[must_use]
    pub fn new(m: &glm::Mat4, layout: MatrixLayout) -> Self {
        match layout {
            MatrixLayout::ColumnMajor => Self((*m).into()),
            MatrixLayout::RowMajor => Self(m.transpose().into()),
        }
    }
}

impl From<&glm::Mat4> for BoneMatrix {
    fn from(m: &glm::Mat4) -> Self {
        Self::new(m, MatrixLayout::ColumnMajor)
    }
}
