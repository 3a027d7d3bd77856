// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! SSAO sample kernel and rotation noise.
//!
//! The kernel is a set of offsets inside the +Z hemisphere. Offsets are
//! pushed outwards with an eased radius so early samples stay close to the
//! shaded point, where occlusion matters most. The noise tile holds random
//! rotations around Z, tiled over the screen to trade banding for
//! high-frequency noise that frame accumulation averages out.

use mfs_core::math::Vec3;
use thiserror::Error;

use super::sampling::SampleSource;

/// Smallest radius of a kernel sample, as a fraction of the full radius.
pub const MIN_DISTANCE: f32 = 0.1;

/// Smallest accepted `z` of a sample direction.
pub const MIN_Z: f32 = 0.1;

/// Consecutive rejected samples after which generation gives up.
pub const MAX_REJECTIONS: usize = 10_000;

/// Errors raised by [`generate_kernel`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KernelError {
    /// A kernel of zero samples was requested.
    #[error("SSAO kernel size must be at least 1")]
    ZeroSize,
    /// The source kept returning directions too close to the XY plane.
    #[error("sample source produced {0} consecutive unusable directions")]
    SamplingExhausted(usize),
}

/// Eased radius of sample `index` in a kernel of `size` samples:
/// `t² · (1 - MIN_DISTANCE) + MIN_DISTANCE` with `t = index / size`.
pub fn kernel_scale(index: usize, size: usize) -> f32 {
    let t = index as f32 / size as f32;
    t * t * (1.0 - MIN_DISTANCE) + MIN_DISTANCE
}

/// Generates `size` hemispherical kernel samples.
///
/// A kernel of one sample is the single zero vector.
pub fn generate_kernel(
    size: u32,
    source: &mut dyn SampleSource,
) -> Result<Vec<Vec3>, KernelError> {
    let size = size as usize;
    match size {
        0 => return Err(KernelError::ZeroSize),
        1 => return Ok(vec![Vec3::ZERO]),
        _ => {}
    }

    let mut kernel = Vec::with_capacity(size);
    let mut rejections = 0;
    while kernel.len() < size {
        let mut v = source.unit_sphere();
        v.z = v.z.abs();
        if v.z < MIN_Z {
            rejections += 1;
            if rejections > MAX_REJECTIONS {
                return Err(KernelError::SamplingExhausted(rejections));
            }
            continue;
        }
        rejections = 0;
        kernel.push(v * kernel_scale(kernel.len(), size));
    }

    Ok(kernel)
}

/// Generates a `size × size` tile of unit rotation vectors at `z = 0`,
/// row-major.
pub fn generate_noise(size: u32, source: &mut dyn SampleSource) -> Vec<Vec3> {
    let count = size as usize * size as usize;
    (0..count).map(|_| source.unit_circle().extend(0.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssao::sampling::RngSampleSource;
    use mfs_core::math::Vec2;

    /// Always returns the same direction.
    struct Fixed(Vec3);

    impl SampleSource for Fixed {
        fn unit_sphere(&mut self) -> Vec3 {
            self.0
        }
        fn unit_circle(&mut self) -> Vec2 {
            Vec2::new(self.0.x, self.0.y)
        }
    }

    #[test]
    fn test_kernel_size_and_hemisphere() {
        let mut source = RngSampleSource::seeded(1);
        for size in [2u32, 3, 16, 64] {
            let kernel = generate_kernel(size, &mut source).unwrap();
            assert_eq!(kernel.len(), size as usize);
            for v in &kernel {
                assert!(v.normalize().z >= MIN_Z - 1e-5, "{:?} leaves the hemisphere", v);
            }
        }
    }

    #[test]
    fn test_kernel_scale_grows() {
        let mut source = RngSampleSource::seeded(2);
        let kernel = generate_kernel(16, &mut source).unwrap();
        let lengths: Vec<f32> = kernel.iter().map(Vec3::length).collect();

        for (i, length) in lengths.iter().enumerate() {
            assert!((length - kernel_scale(i, 16)).abs() < 1e-4);
        }
        assert!(lengths.windows(2).all(|w| w[1] >= w[0] - 1e-5));
        assert!((lengths[0] - MIN_DISTANCE).abs() < 1e-4);
        assert!(lengths[15] < 1.0);
    }

    #[test]
    fn test_single_sample_kernel_is_zero() {
        // A source that would be rejected forever: size 1 must not sample.
        let mut source = Fixed(Vec3::X);
        assert_eq!(generate_kernel(1, &mut source), Ok(vec![Vec3::ZERO]));
    }

    #[test]
    fn test_zero_size_kernel() {
        let mut source = RngSampleSource::seeded(0);
        assert_eq!(generate_kernel(0, &mut source), Err(KernelError::ZeroSize));
    }

    #[test]
    fn test_degenerate_source_gives_up() {
        let mut source = Fixed(Vec3::new(1.0, 0.0, 0.05));
        assert_eq!(
            generate_kernel(4, &mut source),
            Err(KernelError::SamplingExhausted(MAX_REJECTIONS + 1))
        );
    }

    #[test]
    fn test_negative_z_is_mirrored() {
        let mut source = Fixed(Vec3::new(0.0, 0.0, -1.0));
        let kernel = generate_kernel(2, &mut source).unwrap();
        assert!(kernel.iter().all(|v| v.z > 0.0));
    }

    #[test]
    fn test_noise_tile() {
        let mut source = RngSampleSource::seeded(5);
        let noise = generate_noise(4, &mut source);
        assert_eq!(noise.len(), 16);
        for v in &noise {
            assert_eq!(v.z, 0.0);
            assert!(v.length() <= 1.0 + 1e-5);
        }
        assert!(generate_noise(0, &mut source).is_empty());
    }

    #[test]
    fn test_kernel_differs_between_calls() {
        let mut source = RngSampleSource::seeded(9);
        let a = generate_kernel(16, &mut source).unwrap();
        let b = generate_kernel(16, &mut source).unwrap();
        assert_ne!(a, b);
    }
}
