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

//! # MFS Infra
//!
//! Concrete backends for the contracts declared in `mfs-core`: a wgpu
//! implementation of [`GraphicsDevice`](mfs_core::renderer::GraphicsDevice)
//! and the logging bootstrap used by hosts.

pub mod graphics;
pub mod logging;

pub use graphics::wgpu::{create_headless_device, WgpuDevice, WgpuGraphicsContext};
