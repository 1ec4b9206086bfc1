use nalgebra_glm as glm;

/// Dual quaternion
///
/// GLM has support in the `GLM_GTX_dual_quaternion` extension but this does not
/// seem to be available in the `nalgebra_glm` implementation. So the parts
/// needed to hand rigid bone transforms to a dual quaternion skinning shader
/// are implemented here using `glm::Quat`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DualQuat {
    pub real: glm::Quat,
    pub dual: glm::Quat,
}

impl Default for DualQuat {
    fn default() -> Self {
        Self {
            // Real part contains the rotation
            real: glm::quat(0.0, 0.0, 0.0, 1.0),
            // Dual part contains the translation but is also effected by
            // the rotation
            dual: glm::quat(0.0, 0.0, 0.0, 0.0),
        }
    }
}

impl DualQuat {
    /// Creates a unit dual quaternion from a rotation followed by a
    /// translation. `rotation` is expected to be unit length.
    #[must_use]
    pub fn new(rotation: &glm::Quat, translation: &glm::Vec3) -> Self {
        let pure = glm::quat(translation.x, translation.y, translation.z, 0.0);
        Self {
            real: *rotation,
            dual: pure * *rotation * 0.5_f32,
        }
    }
}

/// Conversion to GLSL shader ready mat2x4
impl From<DualQuat> for [[f32; 4]; 2] {
    fn from(dq: DualQuat) -> [[f32; 4]; 2] {
        [
            [dq.real.i, dq.real.j, dq.real.k, dq.real.w],
            [dq.dual.i, dq.dual.j, dq.dual.k, dq.dual.w],
        ]
    }
}

/// Conversion from a column major matrix array
impl From<[[f32; 4]; 4]> for DualQuat {
    fn from(arr: [[f32; 4]; 4]) -> Self {
        from_mat4(&arr.into())
    }
}

#[must_use]
pub fn add(q1: &DualQuat, q2: &DualQuat) -> DualQuat {
    DualQuat {
        real: q1.real + q2.real,
        dual: q1.dual + q2.dual,
    }
}

#[must_use]
pub fn mul(q1: &DualQuat, q2: &DualQuat) -> DualQuat {
    DualQuat {
        real: q1.real * q2.real,
        dual: q1.real * q2.dual + q1.dual * q2.real,
    }
}

#[must_use]
pub fn conjugate(q: &DualQuat) -> DualQuat {
    DualQuat {
        real: q.real.conjugate(),
        dual: q.dual.conjugate(),
    }
}

/// Splits a unit dual quaternion into rotation and translation
#[must_use]
pub fn decompose(dq: &DualQuat) -> (glm::Quat, glm::Vec3) {
    let t = dq.dual * dq.real.conjugate() * 2.0_f32;
    (dq.real, glm::vec3(t.i, t.j, t.k))
}

/// Converts a unit dual quaternion to a rotation and translation matrix
#[must_use]
pub fn to_mat4(dq: &DualQuat) -> glm::Mat4 {
    let (rot, trans) = decompose(dq);
    glm::translation(&trans) * glm::quat_to_mat4(&rot)
}

/// Converts a matrix to a unit dual quaternion. Only rotation and translation
/// survive the conversion. Any scale is removed from the basis vectors before
/// extracting the rotation, and shear is lost.
#[must_use]
pub fn from_mat4(m: &glm::Mat4) -> DualQuat {
    let mut basis = glm::mat4_to_mat3(m);
    for mut column in basis.column_iter_mut() {
        let len = column.norm();
        if len > f32::EPSILON {
            column /= len;
        }
    }
    let rot = glm::quat_normalize(&glm::to_quat(&glm::mat3_to_mat4(&basis)));
    let trans = glm::vec3(m[(0, 3)], m[(1, 3)], m[(2, 3)]);
    DualQuat::new(&rot, &trans)
}

/// Renormalizes a dual quaternion so it is unit again after accumulated
/// floating point error
#[must_use]
pub fn normalize(dq: &DualQuat) -> DualQuat {
    let len = dq.real.norm();
    if len <= f32::EPSILON {
        return DualQuat::default();
    }
    let real = dq.real / len;
    let dual = dq.dual / len;
    // Remove the component of the dual part parallel to the real part
    let dot = real.coords.dot(&dual.coords);
    DualQuat {
        real,
        dual: dual - real * dot,
    }
}
