//! Recommend using with
//! `RUSTFLAGS="-C target-cpu=x86-64-v2" cargo bench`
//!
//! Evaluation runs once per frame for every animated model so the full
//! hierarchy walk is the number that matters. Track sampling and dual
//! quaternion conversion are measured separately to see where the time goes.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra_glm as glm;
use rhizome::{
    anim::{
        Animation, Keyframe, MeshBone, MeshBones, Node, NodeChannel,
        PoseEvaluator, Scene, Track,
    },
    config::PoseOptions,
    dualquat,
};

const BONES: usize = 64;
const KEYS: usize = 120;

#[allow(clippy::cast_precision_loss)]
fn rotation_track() -> Track<glm::Quat> {
    let axis = glm::vec3(0.0_f32, 0.6_f32, 0.8_f32);
    let keys = (0..KEYS)
        .map(|i| {
            let t = i as f32;
            Keyframe::new(t, glm::quat_angle_axis(t * 0.05, &axis))
        })
        .collect();
    Track::new(keys).unwrap()
}

/// Chain of `BONES` bones, every one with its own animated rotation
fn chain_scene() -> Scene {
    let step = glm::translation(&glm::vec3(0.0_f32, 0.5_f32, 0.0_f32));
    let mut node: Option<Node> = None;
    for i in (0..BONES).rev() {
        let mut n = Node::new(&format!("bone.{i}"), step);
        if let Some(child) = node {
            n.children.push(child);
        }
        node = Some(n);
    }
    let mut root = Node::new("root", glm::Mat4::identity());
    root.children.extend(node);

    #[allow(clippy::cast_precision_loss)]
    let mut animation = Animation::new("wave", (KEYS - 1) as f32, 30.0);
    let mut bones = Vec::new();
    for i in 0..BONES {
        let name = format!("bone.{i}");
        let mut channel = NodeChannel::constant(
            &name,
            glm::vec3(0.0, 0.5, 0.0),
            glm::Quat::identity(),
            glm::vec3(1.0, 1.0, 1.0),
        );
        channel.rotations = rotation_track();
        animation.insert(channel);
        bones.push(MeshBone::new(&name, glm::Mat4::identity()));
    }

    let mut scene = Scene::new(root);
    scene.animations.push(animation);
    scene.meshes.push(MeshBones {
        name: "body".to_string(),
        vertex_count: 0,
        bones,
    });
    scene
}

fn sample_rotation(c: &mut Criterion) {
    let track = black_box(rotation_track());
    c.bench_function(
        "sample rotation", //
        |b| b.iter(|| track.sample(black_box(87.3))),
    );
}

fn evaluate_chain(c: &mut Criterion) {
    let mut evaluator = PoseEvaluator::new(chain_scene(), &PoseOptions::default()).unwrap();
    c.bench_function(
        "evaluate chain", //
        |b| {
            b.iter(|| {
                let _ = evaluator.evaluate_seconds(black_box(1.7));
            })
        },
    );
}

fn pose_to_dq(c: &mut Criterion) {
    let mut evaluator = PoseEvaluator::new(chain_scene(), &PoseOptions::default()).unwrap();
    evaluator.evaluate_seconds(1.7).unwrap();
    let m = black_box(evaluator.transforms()[BONES - 1]);
    c.bench_function(
        "mat4_to_dq", //
        |b| b.iter(|| dualquat::from_mat4(&m)),
    );
    c.bench_function(
        "pose dual quats", //
        |b| b.iter(|| evaluator.dual_quats()),
    );
}

criterion_group!(benches, sample_rotation, evaluate_chain, pose_to_dq);
criterion_main!(benches);
