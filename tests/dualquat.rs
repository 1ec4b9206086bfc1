//! Tests for dualquat module
//!
//! Bone transforms are handed to dual quaternion skinning shaders through
//! `DualQuat`, so most of these check that rotation and translation survive
//! the trip from a matrix and back. The arithmetic tests use easy to compare
//! values that are not unit dual quaternions.

use log::info;
use nalgebra_glm as glm;
use rhizome::dualquat::{self, DualQuat};
use std::sync::Once;

const EPSILON: f32 = 0.0001f32; // Small value for float comparisons
static INIT: Once = Once::new();

/// Initializes logging in a "once per test run" manner. Call at the start of
/// each test that needs logging.
fn init_tests() {
    INIT.call_once(|| {
        env_logger::init();
    });
}

/// Verify a result is unit by multiplying by its conjugate
fn check_unit(dq: &DualQuat) {
    let unit = dualquat::mul(dq, &dualquat::conjugate(dq));
    let c = glm::quat_equal_eps(&unit.real, &glm::Quat::identity(), EPSILON);
    assert!(c.x && c.y && c.z && c.w);
    let c = glm::quat_equal_eps(
        &unit.dual,
        &glm::quat(0.0f32, 0.0f32, 0.0f32, 0.0f32),
        EPSILON,
    );
    assert!(c.x && c.y && c.z && c.w);
}

fn compare_mat(m1: &glm::Mat4, m2: &glm::Mat4) {
    let c = glm::equal_columns_eps(m1, m2, EPSILON);
    assert!(c.x && c.y && c.z && c.w, "{m1:?} != {m2:?}");
}

#[test]
fn default() {
    let dq = DualQuat::default();
    assert_eq!(dq.real, glm::Quat::identity());
    assert_eq!(dq.dual, glm::quat(0.0f32, 0.0f32, 0.0f32, 0.0f32));
    assert_eq!(dualquat::to_mat4(&dq), glm::Mat4::identity());
}

#[test]
fn new() {
    init_tests();

    let rot = glm::quat_angle_axis(
        -1.491f32,
        &glm::vec3(0.620174f32, -0.248069f32, 0.744208f32),
    );
    let trans = glm::vec3(-12.6f32, 1204.0f32, 0.004f32);
    let dq = DualQuat::new(&rot, &trans);
    check_unit(&dq);

    // d = 1/2 * t * r where t is the translation as a pure quaternion
    let pure = glm::quat(trans.x, trans.y, trans.z, 0.0f32);
    let dual = 0.5f32 * pure * rot;
    let c = glm::quat_equal_eps(&dq.dual, &dual, EPSILON);
    assert!(c.x && c.y && c.z && c.w);

    let m = glm::translation(&trans) * glm::quat_to_mat4(&rot);
    info!("new m={:?}", m);
    let c = glm::equal_columns_eps(&m, &dualquat::to_mat4(&dq), 0.001);
    assert!(c.x && c.y && c.z && c.w);
}

/// Shader array has real in one column and dual in the other, w last
#[test]
fn from_for_glsl() {
    let dq = DualQuat {
        real: glm::quat(1.0, 2.0, 3.0, 4.0),
        dual: glm::quat(5.0, 6.0, 7.0, 8.0),
    };
    let m: [[f32; 4]; 2] = dq.into();
    assert_eq!(m[0], [1.0, 2.0, 3.0, 4.0]);
    assert_eq!(m[1], [5.0, 6.0, 7.0, 8.0]);
}

#[test]
fn add_and_mul() {
    let dq1 = DualQuat {
        real: glm::quat(1.0, 2.0, 3.0, 4.0),
        dual: glm::quat(-1.0, -2.0, -3.0, -4.0),
    };
    let dq2 = DualQuat {
        real: glm::quat(4.0, 3.0, 2.0, 1.0),
        dual: glm::quat(-4.0, -3.0, -2.0, -1.0),
    };

    // Component wise
    let res = dualquat::add(&dq1, &dq2);
    assert_eq!(res.real, glm::quat(5.0, 5.0, 5.0, 5.0));
    assert_eq!(res.dual, glm::quat(-5.0, -5.0, -5.0, -5.0));

    // [r1 * r2] + [r1 * d2 + d1 * r2]ϵ
    let res = dualquat::mul(&dq1, &dq2);
    assert_eq!(res.real, glm::quat(12.0, 24.0, 6.0, -12.0));
    assert_eq!(res.dual, glm::quat(-24.0, -48.0, -12.0, 24.0));
}

/// Both parts are conjugated independently
#[test]
fn conjugate() {
    let dq = DualQuat {
        real: glm::quat(1.0, 2.0, 3.0, 4.0),
        dual: glm::quat(5.0, 6.0, 7.0, 8.0),
    };
    let conj = dualquat::conjugate(&dq);
    assert_eq!(conj.real, glm::quat(-1.0, -2.0, -3.0, 4.0));
    assert_eq!(conj.dual, glm::quat(-5.0, -6.0, -7.0, 8.0));
}

/// Rigid bone transforms go to a dual quaternion and back unchanged
#[test]
fn rigid_round_trip() {
    init_tests();

    let rot = glm::quat_angle_axis(
        std::f32::consts::FRAC_PI_3,
        &glm::vec3(0.811107f32, 0.486664f32, 0.324443f32),
    );
    let trans = glm::vec3(14.2f32, -3.36f32, 18.9f32);
    let m = glm::translation(&trans) * glm::quat_to_mat4(&rot);

    let dq = dualquat::from_mat4(&m);
    info!("rigid_round_trip dq={:?}", dq);
    check_unit(&dq);
    compare_mat(&dualquat::to_mat4(&dq), &m);

    let (r, t) = dualquat::decompose(&dq);
    // q and -q are the same rotation
    let same = glm::quat_equal_eps(&r, &rot, EPSILON);
    let flipped = glm::quat_equal_eps(&r, &-rot, EPSILON);
    assert!((same.x && same.y && same.z && same.w)
        || (flipped.x && flipped.y && flipped.z && flipped.w));
    let c = glm::equal_eps(&t, &trans, EPSILON);
    assert!(c.x && c.y && c.z);
}

/// Column major array conversion matches the matrix conversion
#[test]
fn from_for_array() {
    let arr: [[f32; 4]; 4] = [
        [1.0f32, 0.0f32, 0.0f32, 0.0f32],        // column 0
        [0.0f32, 0.3584f32, -0.9336f32, 0.0f32], // column 1
        [0.0f32, 0.9336f32, 0.3584f32, 0.0f32],  // column 2
        [5.0f32, 7.0f32, 9.0f32, 1.0f32],        // column 3
    ];
    let m: glm::Mat4 = arr.into();
    let dq: DualQuat = arr.into();
    assert_eq!(dq, dualquat::from_mat4(&m));
    let (_, t) = dualquat::decompose(&dq);
    let c = glm::equal_eps(&t, &glm::vec3(5.0, 7.0, 9.0), EPSILON);
    assert!(c.x && c.y && c.z);
}

/// Blending two bones and renormalizing gives a rigid transform between them
#[test]
fn blend_two_bones() {
    let a = DualQuat::new(
        &glm::Quat::identity(),
        &glm::vec3(2.0f32, 0.0f32, 0.0f32),
    );
    let b = DualQuat::new(
        &glm::quat_angle_axis(
            std::f32::consts::FRAC_PI_2,
            &glm::vec3(0.0f32, 0.0f32, 1.0f32),
        ),
        &glm::vec3(2.0f32, 0.0f32, 0.0f32),
    );
    let half = |dq: &DualQuat| DualQuat {
        real: dq.real * 0.5f32,
        dual: dq.dual * 0.5f32,
    };
    let blend = dualquat::normalize(&dualquat::add(&half(&a), &half(&b)));
    check_unit(&blend);

    let expected = glm::translation(&glm::vec3(2.0f32, 0.0f32, 0.0f32))
        * glm::rotation(
            std::f32::consts::FRAC_PI_4,
            &glm::vec3(0.0f32, 0.0f32, 1.0f32),
        );
    compare_mat(&dualquat::to_mat4(&blend), &expected);
}
