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

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use anyhow::Result;

/// Format the painter renders intermediate results into.
const RENDER_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// Holds the core wgpu state objects required for off-screen rendering.
///
/// The painter renders into its own targets, so no surface is configured.
#[derive(Debug)]
pub struct WgpuGraphicsContext {
    #[allow(dead_code)]
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,

    // Store info for easy access
    pub adapter_name: String,
    pub adapter_backend: wgpu::Backend,
    pub device_limits: wgpu::Limits,

    /// Validation errors that escaped every error scope.
    uncaptured_errors: Arc<AtomicUsize>,
}

impl WgpuGraphicsContext {
    /// Asynchronously initializes a context on the preferred adapter.
    ///
    /// ## Returns
    /// * `Result<Self>` - The initialized context, or an error when no adapter
    ///   or device is available, or when the adapter cannot render into
    ///   `Rgba32Float` targets.
    pub async fn new_headless() -> Result<Self> {
        log::info!("Initializing headless WGPU Graphics Context...");

        // --- 1. Select Adapter ---
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .map_err(|e| anyhow!("No suitable graphics adapter found: {}", e))?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Using graphics adapter: \"{}\" (Backend: {:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let target_features = adapter.get_texture_format_features(RENDER_TARGET_FORMAT);
        let required = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        if !target_features.allowed_usages.contains(required) {
            return Err(anyhow!(
                "Adapter \"{}\" cannot use {:?} as a render target (allowed: {:?})",
                adapter_info.name,
                RENDER_TARGET_FORMAT,
                target_features.allowed_usages
            ));
        }

        // --- 2. Create Logical Device and Command Queue ---
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("MFS Logical Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
            })
            .await
            .map_err(|e| anyhow!("Failed to create logical device: {}", e))?;
        log::info!("Logical device and command queue created.");

        let uncaptured_errors = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&uncaptured_errors);
        device.on_uncaptured_error(Box::new(move |e| {
            counter.fetch_add(1, Ordering::Relaxed);
            log::error!("WGPU Uncaptured Error: {e:?}");
        }));

        let device_limits = device.limits();
        log::debug!("Device limits: {device_limits:?}");

        Ok(WgpuGraphicsContext {
            adapter,
            device,
            queue,
            adapter_name: adapter_info.name,
            adapter_backend: adapter_info.backend,
            device_limits,
            uncaptured_errors,
        })
    }

    /// Number of errors reported outside any error scope since creation.
    pub fn uncaptured_error_count(&self) -> usize {
        self.uncaptured_errors.load(Ordering::Relaxed)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}
