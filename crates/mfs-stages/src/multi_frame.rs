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

//! Assembly of the multi-frame sampling pipeline.
//!
//! ```text
//! host ──viewport/camera/projection──┐
//! ModelLoading → Rasterization → Postprocessing → FrameAccumulation → Blit
//! ```
//!
//! Only the post-processing stage lives in this crate. Model loading,
//! rasterization, accumulation and blit are supplied by the host through
//! [`ExternalStages`]; the builder checks that their ports line up.

use mfs_core::stage::{GraphError, PipelineBuilder, PortDecl, Stage, StageContext, StageError};
use serde::{Deserialize, Serialize};

use crate::ports::{names, CameraInfo, ProjectionInfo, Viewport};
use crate::postprocessing_stage::PostprocessingStage;
use crate::settings::SsaoSettings;
use crate::ssao::SampleSource;

/// Name given to the assembled pipeline.
pub const PIPELINE_NAME: &str = "MultiframeSampling";

/// Scene preset loaded by the model loading stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Preset {
    /// The Jakobi scene.
    #[default]
    Jakobi,
}

/// Settings shared by every stage of the pipeline. Published into the
/// [`StageContext`] before initialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Frames accumulated into one image.
    pub multi_frame_count: u32,
    /// Scene to load.
    pub preset: Preset,
    /// Whether rasterization renders reflections.
    pub use_reflections: bool,
    /// Whether rasterization jitters for depth of field.
    pub use_dof: bool,
    /// Post-processing settings.
    pub ssao: SsaoSettings,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            multi_frame_count: 64,
            preset: Preset::default(),
            use_reflections: false,
            use_dof: false,
            ssao: SsaoSettings::default(),
        }
    }
}

impl PipelineSettings {
    /// Settings of the single-frame variant: one frame, no accumulation.
    pub fn single_frame() -> Self {
        Self {
            multi_frame_count: 1,
            ..Self::default()
        }
    }
}

/// Stages supplied by the host.
pub struct ExternalStages {
    /// Loads the scene.
    pub model_loading: Box<dyn Stage>,
    /// Rasterizes color, normal and depth.
    pub rasterization: Box<dyn Stage>,
    /// Accumulates post-processed frames.
    pub frame_accumulation: Box<dyn Stage>,
    /// Presents the accumulation.
    pub blit: Box<dyn Stage>,
}

/// Ports the host publishes every frame.
pub fn host_inputs() -> [PortDecl; 3] {
    [
        PortDecl::required::<Viewport>(names::VIEWPORT),
        PortDecl::required::<CameraInfo>(names::CAMERA),
        PortDecl::required::<ProjectionInfo>(names::PROJECTION),
    ]
}

/// Assembles the pipeline with an entropy-seeded post-processing stage.
pub fn assemble(
    settings: PipelineSettings,
    external: ExternalStages,
) -> Result<MultiFramePipeline, GraphError> {
    let postprocessing = PostprocessingStage::new(settings.ssao.clone());
    assemble_with(settings, external, postprocessing)
}

/// Assembles the pipeline, sampling SSAO kernels from `source`.
pub fn assemble_with_source(
    settings: PipelineSettings,
    external: ExternalStages,
    source: Box<dyn SampleSource + Send>,
) -> Result<MultiFramePipeline, GraphError> {
    let postprocessing = PostprocessingStage::with_source(settings.ssao.clone(), source);
    assemble_with(settings, external, postprocessing)
}

fn assemble_with(
    settings: PipelineSettings,
    external: ExternalStages,
    postprocessing: PostprocessingStage,
) -> Result<MultiFramePipeline, GraphError> {
    let builder = host_inputs()
        .into_iter()
        .fold(PipelineBuilder::new(PIPELINE_NAME), PipelineBuilder::external_input);

    let pipeline = builder
        .add_stage(external.model_loading)
        .add_stage(external.rasterization)
        .add_stage(Box::new(postprocessing))
        .add_stage(external.frame_accumulation)
        .add_stage(external.blit)
        .build()?;

    Ok(MultiFramePipeline { settings, pipeline })
}

/// The assembled pipeline together with its settings.
#[derive(Debug)]
pub struct MultiFramePipeline {
    settings: PipelineSettings,
    pipeline: mfs_core::stage::Pipeline,
}

impl MultiFramePipeline {
    /// The settings the pipeline was assembled with.
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.pipeline.stage_names()
    }

    /// Publishes the settings, then initializes every stage.
    pub fn initialize(&mut self, ctx: &mut StageContext) -> Result<(), StageError> {
        ctx.publish(self.settings.clone());
        ctx.publish(self.settings.ssao.clone());
        log::info!(
            "Initializing {} ({} frames)",
            self.pipeline.name(),
            self.settings.multi_frame_count
        );
        self.pipeline.initialize(ctx)
    }

    /// Runs one frame.
    pub fn process_frame(&mut self, ctx: &mut StageContext) -> Result<(), StageError> {
        self.pipeline.process_frame(ctx)
    }

    /// Shuts every stage down.
    pub fn shutdown(&mut self, ctx: &mut StageContext) {
        self.pipeline.shutdown(ctx);
    }
}
