// Some code inspired by
// https://github.com/KhronosGroup/glTF-Tutorials/

use super::types::{ImportError, ImportOptions};
use crate::{
    anim::{
        Animation, Interpolate, Interpolation, Keyframe, MeshBone, MeshBones,
        Node, NodeChannel, Scene, Track, VertexWeight,
    },
    rz_error::RzError,
};
use ahash::{HashMap, HashMapExt};
use gltf::{
    accessor::Iter, animation::util::ReadOutputs, buffer::Data, Document, Gltf,
    Semantic,
};
use itertools::Itertools;
use log::{debug, error, info, trace, warn};
use nalgebra_glm as glm;
use std::{fs, io, path::Path};

/// glTF keyframe times are in seconds so one tick is one second
const GLTF_TICKS_PER_SECOND: f32 = 1.0;

/// Converts glTF values into the crate's math types, optionally changing
/// from +Y up to +Z up
#[derive(Clone, Copy)]
struct Convert {
    swizzle: bool,
}

impl Convert {
    /// Basis change for Y axis up to Z axis up
    fn basis() -> glm::Mat4 {
        glm::mat4(
            1.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, -1.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        )
    }

    fn mat(self, m: [[f32; 4]; 4]) -> glm::Mat4 {
        let m: glm::Mat4 = m.into(); // Columns
        if self.swizzle {
            let s = Self::basis();
            s * m * s.transpose()
        } else {
            m
        }
    }

    fn vec(self, v: [f32; 3]) -> glm::Vec3 {
        if self.swizzle {
            glm::vec3(v[0], -v[2], v[1])
        } else {
            v.into()
        }
    }

    /// Scale factors swap axes but never change sign
    fn scale(self, v: [f32; 3]) -> glm::Vec3 {
        if self.swizzle {
            glm::vec3(v[0], v[2], v[1])
        } else {
            v.into()
        }
    }

    /// Input is in x, y, z, w order
    fn quat(self, q: [f32; 4]) -> glm::Quat {
        if self.swizzle {
            glm::quat(q[0], -q[2], q[1], q[3])
        } else {
            glm::quat(q[0], q[1], q[2], q[3])
        }
    }
}

/// Tracks gathered for one node before missing ones are filled in
struct NodeTracks {
    name: String,
    bind: (glm::Vec3, glm::Quat, glm::Vec3),
    positions: Option<Track<glm::Vec3>>,
    rotations: Option<Track<glm::Quat>>,
    scales: Option<Track<glm::Vec3>>,
}

impl NodeTracks {
    fn new(node: &gltf::Node, convert: Convert) -> Self {
        let (t, r, s) = node.transform().decomposed();
        Self {
            name: node_name(node),
            bind: (convert.vec(t), convert.quat(r), convert.scale(s)),
            positions: None,
            rotations: None,
            scales: None,
        }
    }

    /// Any track the animation does not provide holds the bind value
    fn finish(self) -> NodeChannel {
        let (t, r, s) = self.bind;
        NodeChannel {
            node_name: self.name,
            positions: self.positions.unwrap_or_else(|| Track::constant(t)),
            rotations: self.rotations.unwrap_or_else(|| Track::constant(r)),
            scales: self.scales.unwrap_or_else(|| Track::constant(s)),
        }
    }
}

fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map_or_else(|| format!("node.{}", node.index()), ToString::to_string)
}

fn load_impl<P>(path: P) -> Result<(Document, Vec<Data>), RzError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let base = path.parent().unwrap_or_else(|| Path::new("./"));
    let file = fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    let gltf = Gltf::from_reader(reader)?;
    let buffers = gltf::import_buffers(&gltf.document, Some(base), gltf.blob)?;
    info!(
        "{:?}, base path={:?}, buffer count={}",
        path,
        base,
        buffers.len()
    );
    Ok((gltf.document, buffers))
}

/// Loads the node hierarchy, animations and skinned mesh bone lists from a
/// glTF or GLB file. Vertex data other than joints and weights is not read.
///
/// # Errors
/// May return `RzError`
pub fn load<P>(path: P, options: &ImportOptions) -> Result<Scene, RzError>
where
    P: AsRef<Path>,
{
    let (document, buffers) = load_impl(path)?;
    build_scene(&document, &buffers, options)
}

/// Same as `load` for a file already in memory. Buffers must be embedded,
/// either as the GLB binary chunk or as data URIs.
///
/// # Errors
/// May return `RzError`
pub fn load_slice(bytes: &[u8], options: &ImportOptions) -> Result<Scene, RzError> {
    let gltf = Gltf::from_slice(bytes)?;
    let buffers = gltf::import_buffers(&gltf.document, None, gltf.blob)?;
    build_scene(&gltf.document, &buffers, options)
}

fn build_scene(
    document: &Document,
    buffers: &[Data],
    options: &ImportOptions,
) -> Result<Scene, RzError> {
    let convert = Convert {
        swizzle: options.swizzle,
    };
    let root = load_hierarchy(document, convert)?;
    let animations = load_animations(document, buffers, convert)?;
    let meshes = load_meshes(document, buffers, convert, options)?;
    info!(
        "scene root={:?}, nodes={}, animations={}, skinned meshes={}",
        root.name,
        root.count(),
        animations.len(),
        meshes.len()
    );
    Ok(Scene {
        root,
        animations,
        meshes,
    })
}

/// Recursive node tree traversal
fn build_node(node: &gltf::Node, convert: Convert) -> Node {
    let mut ret = Node::new(&node_name(node), convert.mat(node.transform().matrix()));
    for child in node.children() {
        ret.children.push(build_node(&child, convert));
    }
    ret
}

fn load_hierarchy(document: &Document, convert: Convert) -> Result<Node, RzError> {
    let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) else {
        error!("No scene found");
        return Err(ImportError::NoScene.into());
    };
    let roots: Vec<gltf::Node> = scene.nodes().collect();
    match roots.as_slice() {
        [] => Err(ImportError::EmptyScene(scene.index()).into()),
        [single] => Ok(build_node(single, convert)),
        _ => {
            // Several roots go under an identity root so there is a single
            // tree to walk
            let name = scene.name().map_or_else(
                || format!("scene.{}", scene.index()),
                ToString::to_string,
            );
            debug!("scene {:?} has {} roots", name, roots.len());
            let mut root = Node::new(&name, glm::Mat4::identity());
            for node in &roots {
                root.children.push(build_node(node, convert));
            }
            Ok(root)
        }
    }
}

/// Pairs keyframe times with values. Cubic spline samplers store an in
/// tangent, value and out tangent per keyframe and only the value is kept.
fn keyframes<T: Interpolate>(
    times: &[f32],
    values: Vec<T>,
    cubic: bool,
    node: usize,
) -> Result<Track<T>, ImportError> {
    let values: Vec<T> = if cubic {
        values
            .into_iter()
            .tuples::<(T, T, T)>()
            .map(|(_, v, _)| v)
            .collect()
    } else {
        values
    };
    if values.len() != times.len() {
        return Err(ImportError::CountMismatch {
            inputs: times.len(),
            outputs: values.len(),
        });
    }
    let keys = times
        .iter()
        .zip(values)
        .map(|(t, v)| Keyframe::new(*t, v))
        .collect();
    Track::new(keys).map_err(|e| ImportError::BadTrack {
        node,
        source: Box::new(e),
    })
}

fn load_animations(
    document: &Document,
    buffers: &[Data],
    convert: Convert,
) -> Result<Vec<Animation>, RzError> {
    let mut ret = Vec::new();
    for animation in document.animations() {
        let name = animation.name().map_or_else(
            || format!("animation.{}", animation.index()),
            ToString::to_string,
        );
        debug!("animation name={:?}", name);

        // Keyed by node index since names may repeat
        let mut nodes = HashMap::<usize, NodeTracks>::new();
        for channel in animation.channels() {
            let node = channel.target().node();
            let (interpolation, cubic) = match channel.sampler().interpolation() {
                gltf::animation::Interpolation::Step => (Interpolation::Step, false),
                gltf::animation::Interpolation::Linear => {
                    (Interpolation::Linear, false)
                }
                gltf::animation::Interpolation::CubicSpline => {
                    warn!(
                        "animation {:?} node {} cubic spline treated as linear",
                        name,
                        node.index()
                    );
                    (Interpolation::Linear, true)
                }
            };
            let reader = channel.reader(|x| Some(&buffers[x.index()]));
            let times: Vec<f32> = match reader.read_inputs() {
                Some(Iter::Standard(times)) => times.collect(),
                Some(Iter::Sparse(_)) => {
                    error!("Unsupported sparse animation format");
                    return Err(ImportError::SparseAnimation.into());
                }
                None => {
                    error!("Animation does not contain a sampler");
                    return Err(ImportError::NoSampler.into());
                }
            };
            let Some(outputs) = reader.read_outputs() else {
                error!("Animation does not contain a sampler output");
                return Err(ImportError::NoSamplerOutput.into());
            };

            let tracks = nodes
                .entry(node.index())
                .or_insert_with(|| NodeTracks::new(&node, convert));
            match outputs {
                ReadOutputs::Translations(x) => {
                    let values: Vec<glm::Vec3> = x.map(|v| convert.vec(v)).collect();
                    let track = keyframes(&times, values, cubic, node.index())?;
                    tracks.positions = Some(track.with_interpolation(interpolation));
                }
                ReadOutputs::Rotations(x) => {
                    let values: Vec<glm::Quat> = x.into_f32().map(|q| convert.quat(q)).collect();
                    let track = keyframes(&times, values, cubic, node.index())?;
                    tracks.rotations = Some(track.with_interpolation(interpolation));
                }
                ReadOutputs::Scales(x) => {
                    let values: Vec<glm::Vec3> = x.map(|v| convert.scale(v)).collect();
                    let track = keyframes(&times, values, cubic, node.index())?;
                    tracks.scales = Some(track.with_interpolation(interpolation));
                }
                ReadOutputs::MorphTargetWeights(_) => {
                    warn!(
                        "animation {:?} node {} morph target weights ignored",
                        name,
                        node.index()
                    );
                }
            }
        }

        // Sorted so duplicate node names resolve the same way every load
        let mut out = Animation::new(&name, 0.0, GLTF_TICKS_PER_SECOND);
        for (_, tracks) in nodes.into_iter().sorted_by_key(|(index, _)| *index) {
            let channel = tracks.finish();
            out.duration = out.duration.max(channel.end_time());
            if out.channels.contains_key(&channel.node_name) {
                warn!(
                    "animation {:?} has more than one channel for {:?}",
                    name, channel.node_name
                );
            }
            out.insert(channel);
        }
        trace!("animation {:?} duration={}", name, out.duration);
        ret.push(out);
    }
    Ok(ret)
}

/// Bone lists for each skin with offsets but no weights
fn load_skins(
    document: &Document,
    buffers: &[Data],
    convert: Convert,
) -> Result<Vec<Vec<MeshBone>>, RzError> {
    let mut ret = Vec::new();
    for skin in document.skins() {
        let reader = skin.reader(|x| Some(&buffers[x.index()]));
        let joints: Vec<gltf::Node> = skin.joints().collect();
        // Missing inverse bind matrices mean identity matrices
        let inverse_binds: Vec<glm::Mat4> = reader
            .read_inverse_bind_matrices()
            .map_or_else(
                || vec![glm::Mat4::identity(); joints.len()],
                |ibms| ibms.map(|m| convert.mat(m)).collect(),
            );
        if inverse_binds.len() < joints.len() {
            error!("Skin {} is missing inverse bind matrices", skin.index());
            return Err(ImportError::NoInverseBind(skin.index()).into());
        }
        debug!("skin {} has {} joints", skin.index(), joints.len());
        ret.push(
            joints
                .iter()
                .zip(&inverse_binds)
                .map(|(joint, ibm)| MeshBone::new(&node_name(joint), *ibm))
                .collect(),
        );
    }
    Ok(ret)
}

fn load_meshes(
    document: &Document,
    buffers: &[Data],
    convert: Convert,
    options: &ImportOptions,
) -> Result<Vec<MeshBones>, RzError> {
    let skins = load_skins(document, buffers, convert)?;
    let mut used = vec![false; skins.len()];
    let mut ret = Vec::new();

    for node in document.nodes() {
        let (Some(mesh), Some(skin)) = (node.mesh(), node.skin()) else {
            continue;
        };
        used[skin.index()] = true;
        let mesh_name = mesh.name().map_or_else(
            || format!("mesh.{}", mesh.index()),
            ToString::to_string,
        );

        // Each primitive has its own vertices so gets its own bone list
        for p in mesh.primitives() {
            let mut bones = skins[skin.index()].clone();
            let joint_count = bones.len();
            let vertex_count = p.get(&Semantic::Positions).map_or(0, |a| a.count());
            let reader = p.reader(|x| Some(&buffers[x.index()]));
            if let Some(joints) = reader.read_joints(0) {
                let weights = reader
                    .read_weights(0)
                    .ok_or(ImportError::NoWeights)?
                    .into_f32();
                let influences = joints.into_u16().zip(weights);
                for (vertex, (ids, ws)) in influences.enumerate() {
                    #[allow(clippy::cast_possible_truncation)]
                    let vertex = vertex as u32; // glTF counts are 32 bit
                    for (id, weight) in ids.into_iter().zip(ws) {
                        if !(weight > 0.0) {
                            continue;
                        }
                        let bone = bones.get_mut(usize::from(id)).ok_or(
                            ImportError::BigJointIndex {
                                joint: id,
                                joints: joint_count,
                            },
                        )?;
                        bone.weights.push(VertexWeight { vertex, weight });
                    }
                }
            } else {
                warn!("mesh {:?} uses a skin but has no joints", mesh_name);
            }
            ret.push(MeshBones {
                name: format!("{}.{}", mesh_name, p.index()),
                vertex_count,
                bones,
            });
        }
    }

    if options.unused_skins {
        for (skin, bones) in document.skins().zip(skins) {
            if used[skin.index()] {
                continue;
            }
            let name = skin.name().map_or_else(
                || format!("skin.{}", skin.index()),
                ToString::to_string,
            );
            debug!("skin {:?} is not used by a mesh", name);
            ret.push(MeshBones {
                name,
                vertex_count: 0,
                bones,
            });
        }
    }
    Ok(ret)
}
