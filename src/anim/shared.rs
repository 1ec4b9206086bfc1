use crate::types::{BoneMatrix, MatrixLayout};
use nalgebra_glm as glm;
use parking_lot::Mutex;

struct Front {
    matrices: Vec<BoneMatrix>,
    generation: u64,
}

/// Double buffered bone matrices for a renderer running on another thread.
///
/// The evaluating thread fills its own back buffer then swaps it in with
/// `publish`, so readers only ever see complete frames. The lock is held just
/// for the swap or for the duration of a read closure.
pub struct SharedPose {
    front: Mutex<Front>,
}

impl SharedPose {
    /// Creates a buffer of `bone_count` identity matrices at generation 0
    #[must_use]
    pub fn new(bone_count: usize) -> Self {
        Self {
            front: Mutex::new(Front {
                matrices: vec![BoneMatrix::IDENTITY; bone_count],
                generation: 0,
            }),
        }
    }

    /// Swaps a completed frame in. On return `back` holds the previous front
    /// buffer for reuse. Returns the new generation.
    pub fn publish(&self, back: &mut Vec<BoneMatrix>) -> u64 {
        let mut front = self.front.lock();
        std::mem::swap(&mut front.matrices, back);
        front.generation += 1;
        front.generation
    }

    /// Converts transforms into `back` and publishes them
    pub fn publish_transforms(
        &self,
        transforms: &[glm::Mat4],
        layout: MatrixLayout,
        back: &mut Vec<BoneMatrix>,
    ) -> u64 {
        back.clear();
        back.extend(transforms.iter().map(|m| BoneMatrix::new(m, layout)));
        self.publish(back)
    }

    /// Runs `f` with the current frame and its generation
    pub fn read<R>(&self, f: impl FnOnce(&[BoneMatrix], u64) -> R) -> R {
        let front = self.front.lock();
        f(&front.matrices, front.generation)
    }

    /// Copy of the current frame
    #[must_use]
    pub fn snapshot(&self) -> (Vec<BoneMatrix>, u64) {
        self.read(|m, g| (m.to_vec(), g))
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.front.lock().generation
    }
}
