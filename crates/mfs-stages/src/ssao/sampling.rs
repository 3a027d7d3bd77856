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

//! Random sources for kernel and noise generation.

use mfs_core::math::{Vec2, Vec3, TAU};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform samples on the unit sphere and the unit circle.
pub trait SampleSource {
    /// A point uniformly distributed on the surface of the unit sphere.
    fn unit_sphere(&mut self) -> Vec3;

    /// A point uniformly distributed on the unit circle.
    fn unit_circle(&mut self) -> Vec2;
}

/// A [`SampleSource`] backed by any [`rand::Rng`].
#[derive(Debug, Clone)]
pub struct RngSampleSource<R> {
    rng: R,
}

impl<R: Rng> RngSampleSource<R> {
    /// Wraps a generator.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSampleSource<StdRng> {
    /// A deterministic source, for tests and reproducible captures.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// A source seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> SampleSource for RngSampleSource<R> {
    fn unit_sphere(&mut self) -> Vec3 {
        // Archimedes: z uniform in [-1, 1] and a uniform azimuth cover the
        // sphere uniformly.
        let z: f32 = self.rng.gen_range(-1.0..=1.0);
        let phi: f32 = self.rng.gen_range(0.0..TAU);
        let r = (1.0 - z * z).max(0.0).sqrt();
        Vec3::new(r * phi.cos(), r * phi.sin(), z)
    }

    fn unit_circle(&mut self) -> Vec2 {
        let phi: f32 = self.rng.gen_range(0.0..TAU);
        Vec2::new(phi.cos(), phi.sin())
    }
}
