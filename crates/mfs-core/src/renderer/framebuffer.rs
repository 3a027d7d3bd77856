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

//! A set of color attachments rendered into together.
//!
//! Backends have no framebuffer object of their own; a [`Framebuffer`] only
//! tracks which textures are attached where so completeness can be checked
//! before a pass is recorded against it.

use std::fmt;

use crate::math::Extent3D;
use crate::renderer::api::{
    Color, LoadOp, Operations, RenderPassColorAttachment, StoreOp, TextureFormat, TextureId,
    TextureUsage, TextureViewId,
};

/// Maximum number of color attachments a framebuffer can hold.
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

/// A texture attached to one color slot.
#[derive(Debug, Clone, PartialEq)]
pub struct FramebufferAttachment {
    /// The attached texture.
    pub texture: TextureId,
    /// The view rendered into.
    pub view: TextureViewId,
    /// Format of the texture.
    pub format: TextureFormat,
    /// Size of the texture.
    pub size: Extent3D,
    /// Usages the texture was created with.
    pub usage: TextureUsage,
}

/// Result of a completeness check.
#[derive(Debug, Clone, PartialEq)]
pub enum FramebufferStatus {
    /// Every attachment can be rendered into.
    Complete,
    /// No color attachment is present.
    MissingAttachment,
    /// Two attachments disagree on their size.
    SizeMismatch {
        /// Slot whose size differs from the first attachment.
        slot: usize,
        /// Size of the first attachment.
        expected: Extent3D,
        /// Size found in `slot`.
        found: Extent3D,
    },
    /// A depth format sits in a color slot.
    UnrenderableFormat {
        /// Offending slot.
        slot: usize,
        /// Its format.
        format: TextureFormat,
    },
    /// The texture was not created with `RENDER_ATTACHMENT`.
    MissingRenderUsage {
        /// Offending slot.
        slot: usize,
    },
}

impl FramebufferStatus {
    /// Whether the framebuffer can be rendered into.
    pub fn is_complete(&self) -> bool {
        matches!(self, FramebufferStatus::Complete)
    }
}

impl fmt::Display for FramebufferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramebufferStatus::Complete => write!(f, "complete"),
            FramebufferStatus::MissingAttachment => write!(f, "no color attachment"),
            FramebufferStatus::SizeMismatch {
                slot,
                expected,
                found,
            } => write!(
                f,
                "attachment {} is {}x{}, expected {}x{}",
                slot, found.width, found.height, expected.width, expected.height
            ),
            FramebufferStatus::UnrenderableFormat { slot, format } => {
                write!(f, "attachment {} has unrenderable format {:?}", slot, format)
            }
            FramebufferStatus::MissingRenderUsage { slot } => {
                write!(f, "attachment {} lacks RENDER_ATTACHMENT usage", slot)
            }
        }
    }
}

/// Color attachments grouped under a label.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    label: String,
    colors: [Option<FramebufferAttachment>; MAX_COLOR_ATTACHMENTS],
}

impl Framebuffer {
    /// Creates an empty framebuffer.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            colors: Default::default(),
        }
    }

    /// The debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Attaches a texture to `slot`, returning the attachment it replaces.
    ///
    /// # Panics
    ///
    /// If `slot >= MAX_COLOR_ATTACHMENTS`.
    pub fn attach_color(
        &mut self,
        slot: usize,
        attachment: FramebufferAttachment,
    ) -> Option<FramebufferAttachment> {
        self.colors[slot].replace(attachment)
    }

    /// Removes and returns the attachment in `slot`.
    pub fn detach_color(&mut self, slot: usize) -> Option<FramebufferAttachment> {
        self.colors.get_mut(slot).and_then(Option::take)
    }

    /// The attachment in `slot`, if any.
    pub fn color_attachment(&self, slot: usize) -> Option<&FramebufferAttachment> {
        self.colors.get(slot).and_then(Option::as_ref)
    }

    /// Size of the first attachment.
    pub fn extent(&self) -> Option<Extent3D> {
        self.attached().next().map(|(_, a)| a.size)
    }

    fn attached(&self) -> impl Iterator<Item = (usize, &FramebufferAttachment)> {
        self.colors
            .iter()
            .enumerate()
            .filter_map(|(slot, a)| a.as_ref().map(|a| (slot, a)))
    }

    /// Validates that the attachments form a renderable configuration.
    pub fn check_status(&self) -> FramebufferStatus {
        let Some(expected) = self.extent() else {
            return FramebufferStatus::MissingAttachment;
        };

        for (slot, attachment) in self.attached() {
            if attachment.format.is_depth() {
                return FramebufferStatus::UnrenderableFormat {
                    slot,
                    format: attachment.format,
                };
            }
            if !attachment.usage.contains(TextureUsage::RENDER_ATTACHMENT) {
                return FramebufferStatus::MissingRenderUsage { slot };
            }
            if attachment.size != expected {
                return FramebufferStatus::SizeMismatch {
                    slot,
                    expected,
                    found: attachment.size,
                };
            }
        }

        FramebufferStatus::Complete
    }

    /// Logs the completeness status, as an error when incomplete.
    pub fn log_status(&self) -> FramebufferStatus {
        let status = self.check_status();
        if status.is_complete() {
            log::debug!("Framebuffer '{}' is complete", self.label);
        } else {
            log::error!("Framebuffer '{}' is incomplete: {}", self.label, status);
        }
        status
    }

    /// Render pass attachments for every attached slot, cleared to `clear`
    /// and stored.
    pub fn color_attachments(&self, clear: Color) -> Vec<RenderPassColorAttachment<'_>> {
        self.attached()
            .map(|(_, attachment)| RenderPassColorAttachment {
                view: &attachment.view,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(clear),
                    store: StoreOp::Store,
                },
            })
            .collect()
    }
}
