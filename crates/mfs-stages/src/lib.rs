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

//! # MFS Stages
//!
//! The stages of the multi-frame sampling painter: the SSAO post-processing
//! stage with its kernel generator and GPU resource cache, the typed ports
//! stages exchange, and the assembly of the full pipeline around the stages
//! the host provides.

#![warn(missing_docs)]

pub mod multi_frame;
pub mod ports;
pub mod postprocessing_stage;
pub mod settings;
pub mod shaders;
pub mod ssao;

pub use multi_frame::{assemble, ExternalStages, MultiFramePipeline, PipelineSettings, Preset};
pub use postprocessing_stage::{PostprocessingStage, SsaoUniforms, StageState};
pub use settings::{SettingsError, SsaoSettings};
