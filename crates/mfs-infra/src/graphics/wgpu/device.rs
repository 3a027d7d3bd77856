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

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use mfs_core::math::{Extent3D, Origin3D};
use mfs_core::renderer::api::{
    BindGroupDescriptor, BindGroupId, BindGroupLayoutDescriptor, BindGroupLayoutId,
    BindingResource, BufferDescriptor, BufferId, CommandBufferId, PipelineLayoutDescriptor,
    PipelineLayoutId, RenderPipelineDescriptor, RenderPipelineId, SamplerDescriptor, SamplerId,
    ShaderModuleDescriptor, ShaderModuleId, ShaderSourceData, TextureDescriptor, TextureId,
    TextureViewDescriptor, TextureViewId,
};
use mfs_core::renderer::traits::CommandEncoder;
use mfs_core::renderer::{GraphicsDevice, PipelineError, ResourceError, ShaderError};

use super::command::WgpuCommandEncoder;
use super::context::WgpuGraphicsContext;
use super::conversions::IntoWgpu;

/// Locks one of the device maps, turning poisoning into a backend error.
fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, ResourceError> {
    mutex
        .lock()
        .map_err(|e| ResourceError::BackendError(format!("Mutex poisoned ({what}): {e}")))
}

#[derive(Debug)]
struct WgpuTextureEntry {
    wgpu_texture: Arc<wgpu::Texture>,
    size: u64, // To track VRAM accurately on destruction
}

#[derive(Debug)]
struct WgpuBufferEntry {
    wgpu_buffer: Arc<wgpu::Buffer>,
    size: u64,
}

/// A finished command buffer waiting for submission, with the validation
/// error raised while recording it, if any.
#[derive(Debug)]
struct PendingCommandBuffer {
    buffer: wgpu::CommandBuffer,
    recording_error: Option<String>,
}

/// The internal, non-clonable state of the WgpuDevice.
#[derive(Debug)]
struct WgpuDeviceInternal {
    context: Arc<Mutex<WgpuGraphicsContext>>,
    shader_modules: Mutex<HashMap<ShaderModuleId, Arc<wgpu::ShaderModule>>>,
    bind_group_layouts: Mutex<HashMap<BindGroupLayoutId, Arc<wgpu::BindGroupLayout>>>,
    bind_groups: Mutex<HashMap<BindGroupId, Arc<wgpu::BindGroup>>>,
    pipeline_layouts: Mutex<HashMap<PipelineLayoutId, Arc<wgpu::PipelineLayout>>>,
    pipelines: Mutex<HashMap<RenderPipelineId, Arc<wgpu::RenderPipeline>>>,
    buffers: Mutex<HashMap<BufferId, WgpuBufferEntry>>,
    textures: Mutex<HashMap<TextureId, WgpuTextureEntry>>,
    texture_views: Mutex<HashMap<TextureViewId, Arc<wgpu::TextureView>>>,
    samplers: Mutex<HashMap<SamplerId, Arc<wgpu::Sampler>>>,

    // A single counter keeps ids unique across every resource kind.
    next_id: AtomicUsize,

    vram_allocated_bytes: AtomicUsize,

    /// Command buffers that have been finished but not yet submitted.
    pending_command_buffers: Mutex<HashMap<CommandBufferId, PendingCommandBuffer>>,
    command_buffer_id_counter: AtomicU64,
}

/// A clonable, thread-safe handle to the wgpu graphics device.
///
/// Resources live in id-keyed maps so the renderer contracts only ever see
/// plain ids. Clones share the same maps.
#[derive(Clone, Debug)]
pub struct WgpuDevice {
    internal: Arc<WgpuDeviceInternal>,
}

impl WgpuDevice {
    pub fn new(context: Arc<Mutex<WgpuGraphicsContext>>) -> Self {
        Self {
            internal: Arc::new(WgpuDeviceInternal {
                context,
                shader_modules: Mutex::new(HashMap::new()),
                bind_group_layouts: Mutex::new(HashMap::new()),
                bind_groups: Mutex::new(HashMap::new()),
                pipeline_layouts: Mutex::new(HashMap::new()),
                pipelines: Mutex::new(HashMap::new()),
                buffers: Mutex::new(HashMap::new()),
                textures: Mutex::new(HashMap::new()),
                texture_views: Mutex::new(HashMap::new()),
                samplers: Mutex::new(HashMap::new()),
                next_id: AtomicUsize::new(0),
                vram_allocated_bytes: AtomicUsize::new(0),
                pending_command_buffers: Mutex::new(HashMap::new()),
                command_buffer_id_counter: AtomicU64::new(0),
            }),
        }
    }

    fn generate_id(&self) -> usize {
        self.internal.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Helper function to execute an operation with the wgpu::Device locked.
    fn with_wgpu_device<F, R>(&self, operation: F) -> Result<R, ResourceError>
    where
        F: FnOnce(&wgpu::Device) -> Result<R, ResourceError>,
    {
        let context_guard = lock(&self.internal.context, "context")?;
        operation(&context_guard.device)
    }

    /// Runs `operation` inside a validation error scope. A captured
    /// validation error becomes a [`ResourceError::BackendError`] and the
    /// operation's result is dropped.
    fn validated<F, R>(&self, what: &str, operation: F) -> Result<R, ResourceError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue) -> R,
    {
        let context_guard = lock(&self.internal.context, "context")?;
        let device = &context_guard.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = operation(device, &context_guard.queue);
        match pollster::block_on(device.pop_error_scope()) {
            Some(error) => {
                log::error!("WgpuDevice: {what} failed validation: {error}");
                Err(ResourceError::BackendError(format!("{what}: {error}")))
            }
            None => Ok(value),
        }
    }

    /// Name of the adapter the device was created on.
    pub fn adapter_name(&self) -> Option<String> {
        lock(&self.internal.context, "context")
            .ok()
            .map(|guard| guard.adapter_name.clone())
    }

    /// Bytes currently allocated for buffers and textures.
    pub fn allocated_bytes(&self) -> usize {
        self.internal.vram_allocated_bytes.load(Ordering::Relaxed)
    }

    /// Number of backend errors reported outside any error scope.
    pub fn uncaptured_error_count(&self) -> usize {
        lock(&self.internal.context, "context")
            .map(|guard| guard.uncaptured_error_count())
            .unwrap_or_default()
    }

    pub(crate) fn get_wgpu_render_pipeline(
        &self,
        id: RenderPipelineId,
    ) -> Option<Arc<wgpu::RenderPipeline>> {
        let pipelines = lock(&self.internal.pipelines, "pipelines").ok()?;
        pipelines.get(&id).cloned()
    }

    pub(crate) fn get_wgpu_bind_group(&self, id: BindGroupId) -> Option<Arc<wgpu::BindGroup>> {
        let groups = lock(&self.internal.bind_groups, "bind_groups").ok()?;
        groups.get(&id).cloned()
    }

    pub(crate) fn get_wgpu_texture_view(&self, id: TextureViewId) -> Option<Arc<wgpu::TextureView>> {
        let views = lock(&self.internal.texture_views, "texture_views").ok()?;
        views.get(&id).cloned()
    }

    /// Finishes a wgpu::CommandEncoder and registers the resulting buffer.
    ///
    /// Recording errors surface here in wgpu; they are kept with the buffer
    /// and reported by [`GraphicsDevice::submit_command_buffer`].
    pub(crate) fn finish_encoder(&self, encoder: wgpu::CommandEncoder) -> CommandBufferId {
        let id = CommandBufferId(
            self.internal
                .command_buffer_id_counter
                .fetch_add(1, Ordering::SeqCst),
        );
        let pending = match self.internal.context.lock() {
            Ok(context_guard) => {
                context_guard
                    .device
                    .push_error_scope(wgpu::ErrorFilter::Validation);
                let buffer = encoder.finish();
                let recording_error = pollster::block_on(context_guard.device.pop_error_scope())
                    .map(|error| error.to_string());
                PendingCommandBuffer {
                    buffer,
                    recording_error,
                }
            }
            Err(_) => PendingCommandBuffer {
                buffer: encoder.finish(),
                recording_error: Some("context mutex poisoned while finishing".to_string()),
            },
        };
        match lock(&self.internal.pending_command_buffers, "pending_command_buffers") {
            Ok(mut map) => {
                map.insert(id, pending);
            }
            Err(e) => log::error!("WgpuDevice: Dropping command buffer {id:?}: {e}"),
        }
        id
    }

    /// Blocks until the queue is idle.
    pub fn poll_device_blocking(&self) {
        if let Ok(context_guard) = self.internal.context.lock() {
            if let Err(e) = context_guard.device.poll(wgpu::PollType::Wait) {
                log::warn!("Failed to poll device: {:?}", e);
            }
        } else {
            log::error!("WgpuDevice context mutex was poisoned during poll.");
        }
    }

    fn track_allocation(&self, bytes: u64) {
        self.internal
            .vram_allocated_bytes
            .fetch_add(bytes as usize, Ordering::Relaxed);
    }

    fn track_release(&self, bytes: u64) {
        self.internal
            .vram_allocated_bytes
            .fetch_sub(bytes as usize, Ordering::Relaxed);
    }

    fn calculate_texture_size_in_bytes(descriptor: &TextureDescriptor) -> u64 {
        descriptor.size.width as u64
            * descriptor.size.height as u64
            * descriptor.size.depth_or_array_layers as u64
            * descriptor.format.bytes_per_pixel() as u64
    }
}

impl GraphicsDevice for WgpuDevice {
    // --- Shader Module Operations ---

    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError> {
        let wgpu_source = match &descriptor.source {
            ShaderSourceData::Wgsl(cow_str) => wgpu::ShaderSource::Wgsl(cow_str.clone()),
        };
        let label = descriptor.label;

        let module = self.with_wgpu_device(|device| {
            log::debug!("WgpuDevice: Creating wgpu::ShaderModule with label: {label:?}");
            device.push_error_scope(wgpu::ErrorFilter::Validation);
            let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label,
                source: wgpu_source,
            });
            match pollster::block_on(device.pop_error_scope()) {
                Some(error) => Err(ShaderError::CompilationError {
                    label: label.unwrap_or("unlabeled").to_string(),
                    details: error.to_string(),
                }
                .into()),
                None => Ok(Arc::new(module)),
            }
        })?;

        let id = ShaderModuleId(self.generate_id());
        lock(&self.internal.shader_modules, "shader_modules")?.insert(id, module);
        log::info!(
            "WgpuDevice: Created shader module '{}' with ID: {id:?}",
            label.unwrap_or_default()
        );
        Ok(id)
    }

    fn destroy_shader_module(&self, id: ShaderModuleId) -> Result<(), ResourceError> {
        if lock(&self.internal.shader_modules, "shader_modules")?
            .remove(&id)
            .is_some()
        {
            log::debug!("WgpuDevice: Destroyed shader module with ID: {id:?}");
            Ok(())
        } else {
            Err(ShaderError::NotFound { id }.into())
        }
    }

    // --- Bind Group Operations ---

    fn create_bind_group_layout(
        &self,
        descriptor: &BindGroupLayoutDescriptor,
    ) -> Result<BindGroupLayoutId, ResourceError> {
        let entries: Vec<wgpu::BindGroupLayoutEntry> = descriptor
            .entries
            .iter()
            .map(|entry| wgpu::BindGroupLayoutEntry {
                binding: entry.binding,
                visibility: entry.visibility.into_wgpu(),
                ty: entry.ty.clone().into_wgpu(),
                count: None,
            })
            .collect();

        let layout = self.validated("create_bind_group_layout", |device, _| {
            Arc::new(device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: descriptor.label,
                entries: &entries,
            }))
        })?;

        let id = BindGroupLayoutId(self.generate_id());
        lock(&self.internal.bind_group_layouts, "bind_group_layouts")?.insert(id, layout);
        log::info!(
            "WgpuDevice: Created bind group layout '{}' with {} entries, ID: {id:?}",
            descriptor.label.unwrap_or_default(),
            entries.len()
        );
        Ok(id)
    }

    fn destroy_bind_group_layout(&self, id: BindGroupLayoutId) -> Result<(), ResourceError> {
        if lock(&self.internal.bind_group_layouts, "bind_group_layouts")?
            .remove(&id)
            .is_some()
        {
            log::debug!("WgpuDevice: Destroyed bind group layout with ID: {id:?}");
            Ok(())
        } else {
            Err(PipelineError::InvalidBindGroupLayout { id }.into())
        }
    }

    fn create_bind_group(
        &self,
        descriptor: &BindGroupDescriptor,
    ) -> Result<BindGroupId, ResourceError> {
        let layout = lock(&self.internal.bind_group_layouts, "bind_group_layouts")?
            .get(&descriptor.layout)
            .cloned()
            .ok_or(PipelineError::InvalidBindGroupLayout {
                id: descriptor.layout,
            })?;

        // Resolve every id first; the wgpu entries borrow these.
        enum Resolved {
            Buffer(Arc<wgpu::Buffer>, u64, Option<std::num::NonZeroU64>),
            View(Arc<wgpu::TextureView>),
            Sampler(Arc<wgpu::Sampler>),
        }
        let mut resolved = Vec::with_capacity(descriptor.entries.len());
        for entry in descriptor.entries {
            let resource = match entry.resource {
                BindingResource::Buffer(binding) => {
                    let buffer = lock(&self.internal.buffers, "buffers")?
                        .get(&binding.buffer)
                        .map(|e| Arc::clone(&e.wgpu_buffer))
                        .ok_or(ResourceError::NotFound)?;
                    Resolved::Buffer(buffer, binding.offset, binding.size)
                }
                BindingResource::TextureView(view_id) => Resolved::View(
                    self.get_wgpu_texture_view(view_id)
                        .ok_or(ResourceError::NotFound)?,
                ),
                BindingResource::Sampler(sampler_id) => Resolved::Sampler(
                    lock(&self.internal.samplers, "samplers")?
                        .get(&sampler_id)
                        .cloned()
                        .ok_or(ResourceError::NotFound)?,
                ),
            };
            resolved.push((entry.binding, resource));
        }

        let entries: Vec<wgpu::BindGroupEntry> = resolved
            .iter()
            .map(|(binding, resource)| wgpu::BindGroupEntry {
                binding: *binding,
                resource: match resource {
                    Resolved::Buffer(buffer, offset, size) => {
                        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: buffer.as_ref(),
                            offset: *offset,
                            size: *size,
                        })
                    }
                    Resolved::View(view) => wgpu::BindingResource::TextureView(view.as_ref()),
                    Resolved::Sampler(sampler) => {
                        wgpu::BindingResource::Sampler(sampler.as_ref())
                    }
                },
            })
            .collect();

        let group = self.validated("create_bind_group", |device, _| {
            Arc::new(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: descriptor.label,
                layout: &layout,
                entries: &entries,
            }))
        })?;

        let id = BindGroupId(self.generate_id());
        lock(&self.internal.bind_groups, "bind_groups")?.insert(id, group);
        log::debug!(
            "WgpuDevice: Created bind group '{}' with ID: {id:?}",
            descriptor.label.unwrap_or_default()
        );
        Ok(id)
    }

    fn destroy_bind_group(&self, id: BindGroupId) -> Result<(), ResourceError> {
        if lock(&self.internal.bind_groups, "bind_groups")?
            .remove(&id)
            .is_some()
        {
            log::debug!("WgpuDevice: Destroyed bind group with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    // --- Pipeline Operations ---

    fn create_pipeline_layout(
        &self,
        descriptor: &PipelineLayoutDescriptor,
    ) -> Result<PipelineLayoutId, ResourceError> {
        let layouts = {
            let map = lock(&self.internal.bind_group_layouts, "bind_group_layouts")?;
            descriptor
                .bind_group_layouts
                .iter()
                .map(|id| {
                    map.get(id)
                        .cloned()
                        .ok_or(PipelineError::InvalidBindGroupLayout { id: *id })
                })
                .collect::<Result<Vec<_>, _>>()?
        };
        let layout_refs: Vec<&wgpu::BindGroupLayout> = layouts.iter().map(|l| l.as_ref()).collect();

        let layout = self.validated("create_pipeline_layout", |device, _| {
            Arc::new(device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: descriptor.label,
                bind_group_layouts: &layout_refs,
                push_constant_ranges: &[],
            }))
        })?;

        let id = PipelineLayoutId(self.generate_id());
        lock(&self.internal.pipeline_layouts, "pipeline_layouts")?.insert(id, layout);
        log::debug!(
            "WgpuDevice: Created pipeline layout '{}' with ID: {id:?}",
            descriptor.label.unwrap_or_default()
        );
        Ok(id)
    }

    fn destroy_pipeline_layout(&self, id: PipelineLayoutId) -> Result<(), ResourceError> {
        if lock(&self.internal.pipeline_layouts, "pipeline_layouts")?
            .remove(&id)
            .is_some()
        {
            log::debug!("WgpuDevice: Destroyed pipeline layout with ID: {id:?}");
            Ok(())
        } else {
            Err(PipelineError::InvalidPipelineLayout { id }.into())
        }
    }

    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError> {
        log::debug!(
            "WgpuDevice: Creating render pipeline with label: {:?}",
            descriptor.label
        );
        let pipeline_label = || descriptor.label.as_deref().map(String::from);

        // 1. Get the shader modules
        let (vs_module, fs_module) = {
            let modules = lock(&self.internal.shader_modules, "shader_modules")?;
            let vs = modules
                .get(&descriptor.vertex_shader_module)
                .cloned()
                .ok_or_else(|| PipelineError::InvalidShaderModuleForPipeline {
                    id: descriptor.vertex_shader_module,
                    pipeline_label: pipeline_label(),
                })?;
            let fs = match descriptor.fragment_shader_module {
                Some(fs_id) => Some((
                    fs_id,
                    modules.get(&fs_id).cloned().ok_or_else(|| {
                        PipelineError::InvalidShaderModuleForPipeline {
                            id: fs_id,
                            pipeline_label: pipeline_label(),
                        }
                    })?,
                )),
                None => None,
            };
            (vs, fs)
        };

        // 2. Resolve the layout
        let layout = match descriptor.layout {
            Some(layout_id) => Some(
                lock(&self.internal.pipeline_layouts, "pipeline_layouts")?
                    .get(&layout_id)
                    .cloned()
                    .ok_or(PipelineError::InvalidPipelineLayout { id: layout_id })?,
            ),
            None => None,
        };

        // 3. Convert color target states
        let color_target_states: Vec<Option<wgpu::ColorTargetState>> = descriptor
            .color_target_states
            .iter()
            .map(|cts| {
                Some(wgpu::ColorTargetState {
                    format: cts.format.into_wgpu(),
                    blend: None,
                    write_mask: cts.write_mask.into_wgpu(),
                })
            })
            .collect();

        let fragment_entry = match &fs_module {
            Some((fs_id, _)) => Some(descriptor.fragment_entry_point.as_deref().ok_or(
                PipelineError::MissingEntryPointForFragmentShader {
                    pipeline_label: pipeline_label(),
                    shader_id: *fs_id,
                },
            )?),
            None => None,
        };

        // 4. Create the render pipeline
        let pipeline = self.validated("create_render_pipeline", |device, _| {
            let wgpu_descriptor = wgpu::RenderPipelineDescriptor {
                label: descriptor.label.as_deref(),
                layout: layout.as_deref(),
                vertex: wgpu::VertexState {
                    module: &vs_module,
                    entry_point: Some(descriptor.vertex_entry_point.as_ref()),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: fs_module.as_ref().map(|(_, module)| wgpu::FragmentState {
                    module: module.as_ref(),
                    entry_point: fragment_entry,
                    targets: &color_target_states,
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: descriptor.topology.into_wgpu(),
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            };
            Arc::new(device.create_render_pipeline(&wgpu_descriptor))
        })?;

        let id = RenderPipelineId(self.generate_id());
        lock(&self.internal.pipelines, "pipelines")?.insert(id, pipeline);
        log::info!(
            "WgpuDevice: Created render pipeline '{}' with ID: {id:?}",
            descriptor.label.as_deref().unwrap_or_default()
        );
        Ok(id)
    }

    fn destroy_render_pipeline(&self, id: RenderPipelineId) -> Result<(), ResourceError> {
        if lock(&self.internal.pipelines, "pipelines")?
            .remove(&id)
            .is_some()
        {
            log::debug!("WgpuDevice: Destroyed render pipeline with ID: {id:?}");
            Ok(())
        } else {
            Err(PipelineError::InvalidRenderPipeline { id }.into())
        }
    }

    // --- Buffer Operations ---

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let buffer = self.validated("create_buffer", |device, _| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: descriptor.label.as_deref(),
                size: descriptor.size,
                usage: descriptor.usage.into_wgpu(),
                mapped_at_creation: descriptor.mapped_at_creation,
            })
        })?;

        let id = BufferId(self.generate_id());
        self.track_allocation(descriptor.size);
        lock(&self.internal.buffers, "buffers")?.insert(
            id,
            WgpuBufferEntry {
                wgpu_buffer: Arc::new(buffer),
                size: descriptor.size,
            },
        );
        log::info!(
            "WgpuDevice: Created buffer '{}' with ID: {id:?}, size: {} bytes",
            descriptor.label.as_deref().unwrap_or_default(),
            descriptor.size
        );
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        let entry = lock(&self.internal.buffers, "buffers")?
            .remove(&id)
            .ok_or(ResourceError::NotFound)?;
        entry.wgpu_buffer.destroy();
        self.track_release(entry.size);
        log::debug!("WgpuDevice: Destroyed buffer with ID: {id:?}");
        Ok(())
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let buffer = lock(&self.internal.buffers, "buffers")?
            .get(&id)
            .map(|entry| Arc::clone(&entry.wgpu_buffer))
            .ok_or(ResourceError::NotFound)?;

        if offset + data.len() as u64 > buffer.size() {
            return Err(ResourceError::OutOfBounds);
        }

        self.validated("write_buffer", |_, queue| {
            queue.write_buffer(&buffer, offset, data)
        })?;
        log::debug!(
            "WgpuDevice: Wrote {} bytes to buffer ID: {id:?} at offset {offset}",
            data.len()
        );
        Ok(())
    }

    // --- Texture Operations ---

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let texture = self.validated("create_texture", |device, _| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: descriptor.label.as_deref(),
                size: descriptor.size.into_wgpu(),
                mip_level_count: descriptor.mip_level_count,
                sample_count: descriptor.sample_count.into_wgpu(),
                dimension: descriptor.dimension.into_wgpu(),
                format: descriptor.format.into_wgpu(),
                usage: descriptor.usage.into_wgpu(),
                view_formats: &[],
            })
        })?;

        let id = TextureId(self.generate_id());
        let size_in_bytes = Self::calculate_texture_size_in_bytes(descriptor);
        self.track_allocation(size_in_bytes);
        lock(&self.internal.textures, "textures")?.insert(
            id,
            WgpuTextureEntry {
                wgpu_texture: Arc::new(texture),
                size: size_in_bytes,
            },
        );
        log::info!(
            "WgpuDevice: Created texture '{}' with ID: {id:?}, size: {size_in_bytes} bytes (VRAM)",
            descriptor.label.as_deref().unwrap_or_default()
        );
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        let entry = lock(&self.internal.textures, "textures")?
            .remove(&id)
            .ok_or(ResourceError::NotFound)?;
        entry.wgpu_texture.destroy();
        self.track_release(entry.size);
        log::debug!("WgpuDevice: Destroyed texture with ID: {id:?}");
        Ok(())
    }

    fn write_texture(
        &self,
        texture_id: TextureId,
        data: &[u8],
        bytes_per_row: Option<u32>,
        offset: Origin3D,
        size: Extent3D,
    ) -> Result<(), ResourceError> {
        let texture = lock(&self.internal.textures, "textures")?
            .get(&texture_id)
            .map(|entry| Arc::clone(&entry.wgpu_texture))
            .ok_or(ResourceError::NotFound)?;

        self.validated("write_texture", |_, queue| {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: offset.into_wgpu(),
                    aspect: wgpu::TextureAspect::All,
                },
                data,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row,
                    rows_per_image: None,
                },
                size.into_wgpu(),
            )
        })?;
        log::debug!(
            "WgpuDevice: Wrote {} bytes to texture ID: {texture_id:?} at offset {offset:?}",
            data.len()
        );
        Ok(())
    }

    fn create_texture_view(
        &self,
        texture_id: TextureId,
        descriptor: &TextureViewDescriptor,
    ) -> Result<TextureViewId, ResourceError> {
        let texture = lock(&self.internal.textures, "textures")?
            .get(&texture_id)
            .map(|entry| Arc::clone(&entry.wgpu_texture))
            .ok_or(ResourceError::NotFound)?;

        let view = self.validated("create_texture_view", |_, _| {
            Arc::new(texture.create_view(&wgpu::TextureViewDescriptor {
                label: descriptor.label.as_deref(),
                format: descriptor.format.map(|f| f.into_wgpu()),
                dimension: descriptor.dimension.map(|d| d.into_wgpu()),
                usage: None,
                aspect: descriptor.aspect.into_wgpu(),
                base_mip_level: descriptor.base_mip_level,
                mip_level_count: descriptor.mip_level_count,
                base_array_layer: 0,
                array_layer_count: None,
            }))
        })?;

        let id = TextureViewId(self.generate_id());
        lock(&self.internal.texture_views, "texture_views")?.insert(id, view);
        log::info!(
            "WgpuDevice: Created texture view '{}' for texture ID: {texture_id:?} with ID: {id:?}",
            descriptor.label.as_deref().unwrap_or_default()
        );
        Ok(id)
    }

    fn destroy_texture_view(&self, id: TextureViewId) -> Result<(), ResourceError> {
        if lock(&self.internal.texture_views, "texture_views")?
            .remove(&id)
            .is_some()
        {
            log::debug!("WgpuDevice: Destroyed texture view with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        let sampler = self.validated("create_sampler", |device, _| {
            Arc::new(device.create_sampler(&wgpu::SamplerDescriptor {
                label: descriptor.label.as_deref(),
                address_mode_u: descriptor.address_mode_u.into_wgpu(),
                address_mode_v: descriptor.address_mode_v.into_wgpu(),
                address_mode_w: descriptor.address_mode_w.into_wgpu(),
                mag_filter: descriptor.mag_filter.into_wgpu(),
                min_filter: descriptor.min_filter.into_wgpu(),
                mipmap_filter: descriptor.mipmap_filter.into_wgpu(),
                lod_min_clamp: descriptor.lod_min_clamp,
                lod_max_clamp: descriptor.lod_max_clamp,
                compare: None,
                anisotropy_clamp: 1,
                border_color: None,
            }))
        })?;

        let id = SamplerId(self.generate_id());
        lock(&self.internal.samplers, "samplers")?.insert(id, sampler);
        log::info!(
            "WgpuDevice: Created sampler '{}' with ID: {id:?}",
            descriptor.label.as_deref().unwrap_or_default()
        );
        Ok(id)
    }

    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError> {
        if lock(&self.internal.samplers, "samplers")?
            .remove(&id)
            .is_some()
        {
            log::debug!("WgpuDevice: Destroyed sampler with ID: {id:?}");
            Ok(())
        } else {
            Err(ResourceError::NotFound)
        }
    }

    // --- Command Operations ---

    fn create_command_encoder(&self, label: Option<&str>) -> Box<dyn CommandEncoder> {
        let encoder = match self.internal.context.lock() {
            Ok(context_guard) => context_guard
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor { label }),
            Err(poisoned) => {
                log::error!("WgpuDevice context mutex was poisoned while creating an encoder.");
                poisoned
                    .into_inner()
                    .device
                    .create_command_encoder(&wgpu::CommandEncoderDescriptor { label })
            }
        };
        Box::new(WgpuCommandEncoder::new(encoder, self.clone()))
    }

    fn submit_command_buffer(&self, command_buffer: CommandBufferId) -> Result<(), ResourceError> {
        let pending = lock(&self.internal.pending_command_buffers, "pending_command_buffers")?
            .remove(&command_buffer)
            .ok_or(ResourceError::NotFound)?;
        if let Some(error) = pending.recording_error {
            log::error!("WgpuDevice: Command buffer {command_buffer:?} failed recording: {error}");
            return Err(ResourceError::BackendError(format!(
                "command recording: {error}"
            )));
        }
        self.validated("queue submit", |_, queue| {
            queue.submit(std::iter::once(pending.buffer));
        })
    }
}
