use super::types::MeshBones;
use crate::rz_error::RzError;
use ahash::{HashMap, HashMapExt};
use log::{debug, trace};
use nalgebra_glm as glm;

/// Maps bone names to the indices used for the shader uniform array. Indices
/// are handed out in the order bones are first seen and never change, so
/// uniform bindings stay consistent from frame to frame.
#[derive(Clone, Debug)]
pub struct BoneRegistry {
    index_of: HashMap<String, usize>,
    names: Vec<String>,
    offsets: Vec<glm::Mat4>,
    max_bones: usize,
}

impl BoneRegistry {
    #[must_use]
    pub fn new(max_bones: usize) -> Self {
        Self {
            index_of: HashMap::new(),
            names: Vec::new(),
            offsets: Vec::new(),
            max_bones,
        }
    }

    /// Registers a bone and returns its index. A name that is already known
    /// keeps its original index and offset.
    ///
    /// # Errors
    /// Returns `RzError::CapacityExceeded` if a new bone would go past the
    /// maximum bone count.
    pub fn register(
        &mut self,
        name: &str,
        offset: &glm::Mat4,
    ) -> Result<usize, RzError> {
        if let Some(index) = self.index_of.get(name) {
            trace!("bone {:?} already registered as {}", name, index);
            return Ok(*index);
        }
        let index = self.names.len();
        if index >= self.max_bones {
            return Err(RzError::CapacityExceeded {
                count: index + 1,
                max: self.max_bones,
            });
        }
        debug!("bone {:?} registered as {}", name, index);
        self.index_of.insert(name.to_string(), index);
        self.names.push(name.to_string());
        self.offsets.push(*offset);
        Ok(index)
    }

    /// Registers every bone of a mesh part. Returns the registry index of
    /// each bone in the mesh's own order.
    ///
    /// # Errors
    /// Returns `RzError::CapacityExceeded` if the bones do not fit.
    pub fn register_mesh(
        &mut self,
        mesh: &MeshBones,
    ) -> Result<Vec<usize>, RzError> {
        mesh.bones
            .iter()
            .map(|bone| self.register(&bone.name, &bone.offset))
            .collect()
    }

    #[must_use]
    pub fn index(&self, name: &str) -> Option<usize> {
        self.index_of.get(name).copied()
    }

    #[must_use]
    pub fn offset(&self, index: usize) -> Option<&glm::Mat4> {
        self.offsets.get(index)
    }

    #[must_use]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub const fn max_bones(&self) -> usize {
        self.max_bones
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::types::MeshBone;

    #[test]
    fn same_name_same_index() {
        let mut registry = BoneRegistry::new(8);
        let a = glm::translation(&glm::vec3(1.0, 0.0, 0.0));
        let b = glm::translation(&glm::vec3(0.0, 2.0, 0.0));
        assert_eq!(registry.register("hip", &a).unwrap(), 0);
        assert_eq!(registry.register("knee", &b).unwrap(), 1);
        assert_eq!(registry.register("hip", &b).unwrap(), 0);
        assert_eq!(registry.len(), 2);
        // First offset wins
        assert_eq!(registry.offset(0), Some(&a));
        assert_eq!(registry.name(1), Some("knee"));
        assert_eq!(registry.index("knee"), Some(1));
        assert_eq!(registry.index("ankle"), None);
    }

    #[test]
    fn shared_skeleton() {
        let body = MeshBones {
            name: "body".to_string(),
            vertex_count: 0,
            bones: vec![
                MeshBone::new("root", glm::Mat4::identity()),
                MeshBone::new("spine", glm::Mat4::identity()),
            ],
        };
        let head = MeshBones {
            name: "head".to_string(),
            vertex_count: 0,
            bones: vec![
                MeshBone::new("neck", glm::Mat4::identity()),
                MeshBone::new("spine", glm::Mat4::identity()),
            ],
        };
        let mut registry = BoneRegistry::new(8);
        assert_eq!(registry.register_mesh(&body).unwrap(), vec![0, 1]);
        assert_eq!(registry.register_mesh(&head).unwrap(), vec![2, 1]);
        assert_eq!(registry.names(), ["root", "spine", "neck"]);
    }

    #[test]
    fn capacity() {
        let mut registry = BoneRegistry::new(2);
        registry.register("a", &glm::Mat4::identity()).unwrap();
        registry.register("b", &glm::Mat4::identity()).unwrap();
        // Known names still resolve when full
        assert_eq!(registry.register("a", &glm::Mat4::identity()).unwrap(), 0);
        assert!(matches!(
            registry.register("c", &glm::Mat4::identity()),
            Err(RzError::CapacityExceeded { count: 3, max: 2 })
        ));
        assert_eq!(registry.len(), 2);
    }
}
