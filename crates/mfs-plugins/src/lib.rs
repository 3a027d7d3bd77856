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

//! # MFS Plugins
//!
//! Registers the painters this workspace offers so hosts can discover them
//! by name. Registration goes through `inventory`; any crate linked into the
//! host may submit further [`PainterDescriptor`]s.

#![warn(missing_docs)]

use mfs_core::stage::GraphError;
use mfs_stages::{assemble, ExternalStages, MultiFramePipeline, PipelineSettings};

/// The pipeline configuration a painter stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PainterKind {
    /// Accumulates the default number of frames.
    MultiFrame,
    /// Renders every frame on its own.
    SingleFrame,
}

/// A painter a host can instantiate.
#[derive(Debug)]
pub struct PainterDescriptor {
    /// Unique name hosts look the painter up by.
    pub name: &'static str,
    /// Short human readable description.
    pub description: &'static str,
    /// Who publishes the painter.
    pub organization: &'static str,
    /// Painter version string.
    pub version: &'static str,
    /// Which pipeline configuration the painter assembles.
    pub kind: PainterKind,
}

inventory::collect!(PainterDescriptor);

inventory::submit! {
    PainterDescriptor {
        name: "MultiFramePainter",
        description: "Moep",
        organization: env!("CARGO_PKG_AUTHORS"),
        version: "v0.0.0",
        kind: PainterKind::MultiFrame,
    }
}

inventory::submit! {
    PainterDescriptor {
        name: "SingleFramePainter",
        description: "Moep",
        organization: env!("CARGO_PKG_AUTHORS"),
        version: "v0.0.0",
        kind: PainterKind::SingleFrame,
    }
}

impl PainterDescriptor {
    /// Settings the painter's pipeline starts from.
    pub fn settings(&self) -> PipelineSettings {
        match self.kind {
            PainterKind::MultiFrame => PipelineSettings::default(),
            PainterKind::SingleFrame => PipelineSettings::single_frame(),
        }
    }

    /// Assembles the painter's pipeline around the host's stages.
    pub fn assemble(&self, external: ExternalStages) -> Result<MultiFramePipeline, GraphError> {
        log::info!(
            "Assembling painter '{}' {} ({})",
            self.name,
            self.version,
            self.organization
        );
        assemble(self.settings(), external)
    }
}

/// Every registered painter, sorted by name.
pub fn painters() -> Vec<&'static PainterDescriptor> {
    let mut all: Vec<_> = inventory::iter::<PainterDescriptor>.into_iter().collect();
    all.sort_by_key(|p| p.name);
    all
}

/// Looks a registered painter up by name.
pub fn find_painter(name: &str) -> Option<&'static PainterDescriptor> {
    inventory::iter::<PainterDescriptor>
        .into_iter()
        .find(|p| p.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_painters_are_registered() {
        let names: Vec<_> = painters().iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["MultiFramePainter", "SingleFramePainter"]);
    }

    #[test]
    fn test_descriptors_carry_package_metadata() {
        let painter = find_painter("MultiFramePainter").unwrap();
        assert_eq!(painter.description, "Moep");
        assert_eq!(painter.version, "v0.0.0");
        assert_eq!(painter.organization, "eraflo");
        assert_eq!(painter.kind, PainterKind::MultiFrame);
    }

    #[test]
    fn test_single_frame_painter_uses_one_frame() {
        let painter = find_painter("SingleFramePainter").unwrap();
        assert_eq!(painter.settings().multi_frame_count, 1);
        assert_eq!(
            find_painter("MultiFramePainter")
                .unwrap()
                .settings()
                .multi_frame_count,
            PipelineSettings::default().multi_frame_count
        );
    }

    #[test]
    fn test_unknown_painter_is_not_found() {
        assert!(find_painter("Moep").is_none());
    }
}
