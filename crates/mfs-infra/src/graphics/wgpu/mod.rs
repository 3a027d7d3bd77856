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

//! The wgpu implementation of the renderer contracts.

mod command;
mod context;
mod conversions;
mod device;

pub use command::{WgpuCommandEncoder, WgpuRenderPass};
pub use context::WgpuGraphicsContext;
pub use conversions::IntoWgpu;
pub use device::WgpuDevice;

use std::sync::{Arc, Mutex};

/// Creates a device on the first available adapter, without a surface.
///
/// Blocks the caller on adapter and device requests.
pub fn create_headless_device() -> anyhow::Result<WgpuDevice> {
    let context = pollster::block_on(WgpuGraphicsContext::new_headless())?;
    Ok(WgpuDevice::new(Arc::new(Mutex::new(context))))
}
