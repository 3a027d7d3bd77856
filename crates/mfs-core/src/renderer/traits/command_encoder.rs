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

use crate::renderer::api::{BindGroupId, CommandBufferId, RenderPassDescriptor, RenderPipelineId};
use std::ops::Range;

/// An active render pass, recording draw commands.
///
/// The pass ends when the boxed object is dropped. The `'pass` lifetime keeps
/// it from outliving the [`CommandEncoder`] that created it.
pub trait RenderPass<'pass> {
    /// Sets the pipeline used by subsequent draws.
    fn set_pipeline(&mut self, pipeline: &'pass RenderPipelineId);

    /// Binds a bind group at `index`.
    fn set_bind_group(&mut self, index: u32, bind_group: &'pass BindGroupId);

    /// Records a non-indexed draw.
    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>);
}

/// Records GPU commands into a command buffer.
pub trait CommandEncoder {
    /// Begins a render pass. Only one pass can be open at a time since the
    /// returned pass borrows the encoder mutably.
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'encoder>,
    ) -> Box<dyn RenderPass<'encoder> + 'encoder>;

    /// Finishes recording. The returned id is submitted through
    /// [`GraphicsDevice::submit_command_buffer`](crate::renderer::GraphicsDevice::submit_command_buffer).
    fn finish(self: Box<Self>) -> CommandBufferId;
}
