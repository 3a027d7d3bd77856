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

//! Backend-agnostic rendering contracts.
//!
//! Stages describe GPU work through the descriptor types in [`api`] and the
//! traits in [`traits`]; backends such as the wgpu implementation in
//! `mfs-infra` turn those into real objects and hand back opaque ids.

pub mod api;
pub mod error;
pub mod framebuffer;
pub mod traits;

pub use self::api::*;
pub use self::error::{PipelineError, ResourceError, ShaderError};
pub use self::framebuffer::{Framebuffer, FramebufferAttachment, FramebufferStatus};
pub use self::traits::{CommandEncoder, GraphicsDevice, RenderPass};
