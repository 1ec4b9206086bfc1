use super::{registry::BoneRegistry, types::MeshBones};
use crate::rz_error::RzError;
use bytemuck::{Pod, Zeroable};
use log::warn;

/// Bone influences per vertex supported by the skinning shader
pub const MAX_INFLUENCES: usize = 4;

/// Per vertex bone indices and weights in a vertex buffer friendly layout.
/// Unused slots have a weight of zero.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Zeroable, Pod)]
pub struct VertexBones {
    pub ids: [u32; MAX_INFLUENCES],
    pub weights: [f32; MAX_INFLUENCES],
}

impl VertexBones {
    /// Adds an influence. When all slots are taken the smallest weight is
    /// replaced if the new one is larger. Returns false if an influence was
    /// discarded.
    pub fn add(&mut self, id: u32, weight: f32) -> bool {
        if let Some(slot) = self.weights.iter().position(|w| *w == 0.0) {
            self.ids[slot] = id;
            self.weights[slot] = weight;
            return true;
        }
        let (slot, smallest) = self
            .weights
            .iter()
            .copied()
            .enumerate()
            .fold((0, f32::INFINITY), |acc, (i, w)| {
                if w < acc.1 {
                    (i, w)
                } else {
                    acc
                }
            });
        if weight > smallest {
            self.ids[slot] = id;
            self.weights[slot] = weight;
        }
        false
    }

    /// Scales the weights so they sum to one. Vertices with no influences are
    /// left alone.
    pub fn normalize(&mut self) {
        let sum: f32 = self.weights.iter().sum();
        if sum > 0.0 {
            for w in &mut self.weights {
                *w /= sum;
            }
        }
    }

    #[must_use]
    pub fn influence_count(&self) -> usize {
        self.weights.iter().filter(|w| **w > 0.0).count()
    }
}

/// Builds the bone id and weight stream for one mesh part. Every bone of the
/// mesh must already be in the registry.
///
/// # Errors
/// Returns `RzError::BoneNotFound` for a bone missing from the registry and
/// `RzError::VertexOutOfRange` for an influence on a vertex past the end of
/// the mesh.
pub fn vertex_bones(
    mesh: &MeshBones,
    registry: &BoneRegistry,
) -> Result<Vec<VertexBones>, RzError> {
    let mut ret = vec![VertexBones::default(); mesh.vertex_count];
    let mut discarded = 0_usize;
    for bone in &mesh.bones {
        let id = registry
            .index(&bone.name)
            .ok_or_else(|| RzError::BoneNotFound(bone.name.clone()))?;
        #[allow(clippy::cast_possible_truncation)]
        let id = id as u32; // Registry capacity is far below u32::MAX
        for vw in &bone.weights {
            // Zero weights would look like free slots
            if !(vw.weight > 0.0) {
                continue;
            }
            let vb = ret.get_mut(vw.vertex as usize).ok_or(
                RzError::VertexOutOfRange {
                    vertex: vw.vertex,
                    vertex_count: mesh.vertex_count,
                },
            )?;
            if !vb.add(id, vw.weight) {
                discarded += 1;
            }
        }
    }
    if discarded > 0 {
        warn!(
            "mesh {:?} has {} influences beyond {} per vertex, smallest dropped",
            mesh.name, discarded, MAX_INFLUENCES
        );
    }
    for vb in &mut ret {
        vb.normalize();
    }
    Ok(ret)
}
