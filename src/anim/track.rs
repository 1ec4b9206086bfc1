use crate::rz_error::RzError;
use nalgebra::UnitQuaternion;
use nalgebra_glm as glm;

/// Below this the slerp of two rotations is ambiguous and normalized linear
/// interpolation is used instead
const SLERP_EPSILON: f32 = 1.0e-6;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Interpolation {
    #[default]
    Linear,
    Step,
}

/// Values that can be blended between two keyframes
pub trait Interpolate: Copy {
    fn interpolate(a: &Self, b: &Self, factor: f32) -> Self;
}

impl Interpolate for glm::Vec3 {
    fn interpolate(a: &Self, b: &Self, factor: f32) -> Self {
        glm::lerp(a, b, factor)
    }
}

impl Interpolate for glm::Quat {
    /// Spherical linear interpolation along the shortest arc. The result is
    /// normalized again since slerp of nearly unit inputs drifts.
    fn interpolate(a: &Self, b: &Self, factor: f32) -> Self {
        let ua = UnitQuaternion::new_normalize(*a);
        let ub = UnitQuaternion::new_normalize(*b);
        let q = ua
            .try_slerp(&ub, factor, SLERP_EPSILON)
            .unwrap_or_else(|| ua.nlerp(&ub, factor));
        glm::quat_normalize(&q.into_inner())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Keyframe<T> {
    pub time: f32,
    pub value: T,
}

impl<T> Keyframe<T> {
    pub const fn new(time: f32, value: T) -> Self {
        Self { time, value }
    }
}

/// An ordered list of keyframes for one property of one node. A track always
/// has at least one keyframe and its times never decrease.
#[derive(Clone, Debug, PartialEq)]
pub struct Track<T> {
    interpolation: Interpolation,
    keys: Vec<Keyframe<T>>,
}

impl<T: Interpolate> Track<T> {
    /// Creates a track after checking the keyframes are usable for sampling
    ///
    /// # Errors
    /// Returns `RzError::EmptyTrack` if there are no keyframes,
    /// `RzError::InvalidKeyTime` for a NaN or infinite time, and
    /// `RzError::UnsortedTrack` if a time is earlier than the one before it.
    pub fn new(keys: Vec<Keyframe<T>>) -> Result<Self, RzError> {
        if keys.is_empty() {
            return Err(RzError::EmptyTrack);
        }
        let mut previous = f32::NEG_INFINITY;
        for (i, key) in keys.iter().enumerate() {
            if !key.time.is_finite() {
                return Err(RzError::InvalidKeyTime(i));
            }
            if key.time < previous {
                return Err(RzError::UnsortedTrack(i));
            }
            previous = key.time;
        }
        Ok(Self {
            interpolation: Interpolation::Linear,
            keys,
        })
    }

    /// Creates a track holding a single value for all time
    pub fn constant(value: T) -> Self {
        Self {
            interpolation: Interpolation::Linear,
            keys: vec![Keyframe::new(0.0, value)],
        }
    }

    #[must_use]
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub const fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn keys(&self) -> &[Keyframe<T>] {
        &self.keys
    }

    pub fn start_time(&self) -> f32 {
        self.keys[0].time
    }

    pub fn end_time(&self) -> f32 {
        self.keys[self.keys.len() - 1].time
    }

    /// Clamps a time into the range covered by the keyframes. NaN becomes the
    /// start time.
    pub fn clamp_time(&self, time: f32) -> f32 {
        if time.is_nan() {
            self.start_time()
        } else {
            time.clamp(self.start_time(), self.end_time())
        }
    }

    /// Index of the first keyframe of the segment containing `time`. Scans
    /// from the start on every call which is fine for the handful of keys a
    /// typical bone track has.
    fn bracket(&self, time: f32) -> Option<usize> {
        if !(time >= self.start_time()) {
            return None;
        }
        (0..self.keys.len() - 1).find(|&i| time < self.keys[i + 1].time)
    }

    fn blend(&self, i: usize, time: f32) -> T {
        let from = &self.keys[i];
        let to = &self.keys[i + 1];
        if self.interpolation == Interpolation::Step {
            return from.value;
        }
        // The bracket guarantees from.time <= time < to.time so the span is
        // never zero
        let factor = (time - from.time) / (to.time - from.time);
        T::interpolate(&from.value, &to.value, factor)
    }

    /// Samples the track at `time`
    ///
    /// # Errors
    /// Returns `RzError::OutOfRange` if `time` is before the first keyframe,
    /// after the last keyframe, or NaN. A track with a single keyframe never
    /// fails.
    pub fn sample(&self, time: f32) -> Result<T, RzError> {
        if self.keys.len() == 1 {
            return Ok(self.keys[0].value);
        }
        if let Some(i) = self.bracket(time) {
            return Ok(self.blend(i, time));
        }
        if time == self.end_time() {
            return Ok(self.keys[self.keys.len() - 1].value);
        }
        Err(RzError::OutOfRange {
            time,
            start: self.start_time(),
            end: self.end_time(),
        })
    }

    /// Samples the track after clamping `time` into its range
    pub fn sample_clamped(&self, time: f32) -> T {
        let time = self.clamp_time(time);
        self.bracket(time)
            .map_or(self.keys[self.keys.len() - 1].value, |i| {
                self.blend(i, time)
            })
    }
}
