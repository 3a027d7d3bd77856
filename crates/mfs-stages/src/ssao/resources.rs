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

//! GPU resources owned by the SSAO stage.

use std::borrow::Cow;

use mfs_core::math::{Extent3D, Origin3D, Vec3, Vec4};
use mfs_core::renderer::{
    AddressMode, FilterMode, Framebuffer, FramebufferAttachment, FramebufferStatus,
    GraphicsDevice, ResourceError, SampleCount, SamplerDescriptor, SamplerId, TextureDescriptor,
    TextureDimension, TextureFormat, TextureId, TextureUsage, TextureViewDescriptor,
    TextureViewDimension, TextureViewId,
};

/// Format of the render target and of the kernel and noise textures.
pub const SSAO_FORMAT: TextureFormat = TextureFormat::Rgba32Float;

const TARGET_SLOT: usize = 0;

/// What [`SsaoResources::ensure_render_target`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum ResizeOutcome {
    /// A target of the requested size already existed.
    Unchanged,
    /// A new target was created and attached. Carries the completeness of
    /// the framebuffer afterwards.
    Reallocated(FramebufferStatus),
}

#[derive(Debug, Clone, Copy)]
struct GpuTexture {
    texture: TextureId,
    view: TextureViewId,
}

impl GpuTexture {
    fn release(self, device: &dyn GraphicsDevice, what: &str) {
        if let Err(e) = device.destroy_texture_view(self.view) {
            log::warn!("Failed to destroy {} view {:?}: {}", what, self.view, e);
        }
        if let Err(e) = device.destroy_texture(self.texture) {
            log::warn!("Failed to destroy {} texture {:?}: {}", what, self.texture, e);
        }
    }
}

/// Widens vec3 data to RGBA32F texels.
fn pack_texels(data: &[Vec3]) -> Vec<Vec4> {
    data.iter().map(|v| v.extend(0.0)).collect()
}

/// Owns the render target and its framebuffer, the per-frame kernel texture,
/// the noise tile and the sampler shared by both.
#[derive(Debug)]
pub struct SsaoResources {
    framebuffer: Framebuffer,
    kernel: Option<GpuTexture>,
    noise: Option<GpuTexture>,
    sampler: Option<SamplerId>,
}

impl Default for SsaoResources {
    fn default() -> Self {
        Self::new()
    }
}

impl SsaoResources {
    /// Creates an empty cache. Nothing is allocated until first use.
    pub fn new() -> Self {
        Self {
            framebuffer: Framebuffer::new("ssao_framebuffer"),
            kernel: None,
            noise: None,
            sampler: None,
        }
    }

    /// The framebuffer rendered into.
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// The framebuffer, for attaching outputs beyond the render target.
    /// Attachments outside slot 0 are owned by the caller and never
    /// destroyed here.
    pub fn framebuffer_mut(&mut self) -> &mut Framebuffer {
        &mut self.framebuffer
    }

    /// View of the render target, if allocated.
    pub fn render_target_view(&self) -> Option<TextureViewId> {
        self.framebuffer.color_attachment(TARGET_SLOT).map(|a| a.view)
    }

    /// Size of the render target, if allocated.
    pub fn render_target_size(&self) -> Option<Extent3D> {
        self.framebuffer.color_attachment(TARGET_SLOT).map(|a| a.size)
    }

    /// View of the current kernel texture.
    pub fn kernel_view(&self) -> Option<TextureViewId> {
        self.kernel.map(|k| k.view)
    }

    /// Texture holding the noise tile.
    pub fn noise_texture(&self) -> Option<TextureId> {
        self.noise.map(|n| n.texture)
    }

    /// View of the noise tile.
    pub fn noise_view(&self) -> Option<TextureViewId> {
        self.noise.map(|n| n.view)
    }

    /// The kernel and noise sampler, if created.
    pub fn sampler(&self) -> Option<SamplerId> {
        self.sampler
    }

    /// Creates the nearest, mirror-repeat sampler on first call.
    pub fn ensure_sampler(&mut self, device: &dyn GraphicsDevice) -> Result<SamplerId, ResourceError> {
        if let Some(sampler) = self.sampler {
            return Ok(sampler);
        }
        let sampler = device.create_sampler(&SamplerDescriptor::uniform(
            "ssao_sampler",
            AddressMode::MirrorRepeat,
            FilterMode::Nearest,
        ))?;
        self.sampler = Some(sampler);
        Ok(sampler)
    }

    /// Makes sure the render target is `width × height`, reallocating it
    /// otherwise. Zero dimensions are clamped to one.
    ///
    /// An incomplete framebuffer is logged and reported through the outcome;
    /// what to do about it is the caller's decision.
    pub fn ensure_render_target(
        &mut self,
        device: &dyn GraphicsDevice,
        width: u32,
        height: u32,
    ) -> Result<ResizeOutcome, ResourceError> {
        let size = Extent3D::d2(width.max(1), height.max(1));
        if self.render_target_size() == Some(size) {
            return Ok(ResizeOutcome::Unchanged);
        }

        self.release_render_target(device);

        let usage = TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING;
        let texture = device.create_texture(&TextureDescriptor {
            label: Some(Cow::Borrowed("ssao_render_target")),
            size,
            mip_level_count: 1,
            sample_count: SampleCount::X1,
            dimension: TextureDimension::D2,
            format: SSAO_FORMAT,
            usage,
        })?;
        let view = match device.create_texture_view(texture, &TextureViewDescriptor::default()) {
            Ok(view) => view,
            Err(e) => {
                if let Err(e) = device.destroy_texture(texture) {
                    log::warn!("Failed to destroy orphaned render target: {}", e);
                }
                return Err(e);
            }
        };

        self.framebuffer.attach_color(
            TARGET_SLOT,
            FramebufferAttachment {
                texture,
                view,
                format: SSAO_FORMAT,
                size,
                usage,
            },
        );
        log::info!(
            "SSAO render target allocated at {}x{}",
            size.width,
            size.height
        );

        Ok(ResizeOutcome::Reallocated(self.framebuffer.log_status()))
    }

    /// Uploads a freshly generated kernel as a 1D texture, replacing the
    /// previous one.
    pub fn upload_kernel(
        &mut self,
        device: &dyn GraphicsDevice,
        kernel: &[Vec3],
    ) -> Result<(), ResourceError> {
        if kernel.is_empty() {
            return Err(ResourceError::OutOfBounds);
        }
        let uploaded = self.upload(
            device,
            "ssao_kernel",
            kernel,
            Extent3D::d1(kernel.len() as u32),
            TextureDimension::D1,
        )?;
        if let Some(previous) = self.kernel.replace(uploaded) {
            previous.release(device, "SSAO kernel");
        }
        log::debug!("Uploaded SSAO kernel of {} samples", kernel.len());
        Ok(())
    }

    /// Uploads the noise tile. The tile is immutable once uploaded; later
    /// calls keep it and return `Ok`.
    pub fn upload_noise(
        &mut self,
        device: &dyn GraphicsDevice,
        noise: &[Vec3],
        tile_size: u32,
    ) -> Result<(), ResourceError> {
        if self.noise.is_some() {
            log::warn!("SSAO noise tile already uploaded, keeping the existing one");
            return Ok(());
        }
        if tile_size == 0 || noise.len() != tile_size as usize * tile_size as usize {
            return Err(ResourceError::OutOfBounds);
        }
        let uploaded = self.upload(
            device,
            "ssao_noise",
            noise,
            Extent3D::d2(tile_size, tile_size),
            TextureDimension::D2,
        )?;
        self.noise = Some(uploaded);
        log::info!("Uploaded SSAO noise tile of {}x{}", tile_size, tile_size);
        Ok(())
    }

    fn upload(
        &self,
        device: &dyn GraphicsDevice,
        label: &str,
        data: &[Vec3],
        size: Extent3D,
        dimension: TextureDimension,
    ) -> Result<GpuTexture, ResourceError> {
        let texture = device.create_texture(&TextureDescriptor {
            label: Some(Cow::Borrowed(label)),
            size,
            mip_level_count: 1,
            sample_count: SampleCount::X1,
            dimension,
            format: SSAO_FORMAT,
            usage: TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        })?;

        let texels = pack_texels(data);
        let view_dimension = match dimension {
            TextureDimension::D1 => TextureViewDimension::D1,
            TextureDimension::D2 => TextureViewDimension::D2,
            TextureDimension::D3 => TextureViewDimension::D3,
        };
        let view = device
            .write_texture(
                texture,
                bytemuck::cast_slice(&texels),
                Some(size.width * SSAO_FORMAT.bytes_per_pixel()),
                Origin3D::ZERO,
                size,
            )
            .and_then(|()| {
                device.create_texture_view(
                    texture,
                    &TextureViewDescriptor {
                        label: Some(Cow::Borrowed(label)),
                        dimension: Some(view_dimension),
                        ..Default::default()
                    },
                )
            });

        match view {
            Ok(view) => Ok(GpuTexture { texture, view }),
            Err(e) => {
                if let Err(e) = device.destroy_texture(texture) {
                    log::warn!("Failed to destroy orphaned texture '{}': {}", label, e);
                }
                Err(e)
            }
        }
    }

    fn release_render_target(&mut self, device: &dyn GraphicsDevice) {
        if let Some(old) = self.framebuffer.detach_color(TARGET_SLOT) {
            GpuTexture {
                texture: old.texture,
                view: old.view,
            }
            .release(device, "SSAO render target");
        }
    }

    /// Releases every resource. Failures are logged, not returned.
    pub fn destroy(&mut self, device: &dyn GraphicsDevice) {
        self.release_render_target(device);
        if let Some(kernel) = self.kernel.take() {
            kernel.release(device, "SSAO kernel");
        }
        if let Some(noise) = self.noise.take() {
            noise.release(device, "SSAO noise");
        }
        if let Some(sampler) = self.sampler.take() {
            if let Err(e) = device.destroy_sampler(sampler) {
                log::warn!("Failed to destroy SSAO sampler: {}", e);
            }
        }
    }
}
