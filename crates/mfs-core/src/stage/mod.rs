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

//! # Stage Abstraction
//!
//! A **stage** is one step of a rendering pipeline: it declares the named,
//! typed ports it reads and writes, and runs once per frame against a shared
//! [`StageContext`].
//!
//! Stages are wired together by [`PipelineBuilder`], which matches every input
//! port to exactly one producer by name, checks that both sides agree on the
//! value type, and orders the stages so producers always run before their
//! consumers. Wiring errors surface once, at build time.
//!
//! ```text
//! on_initialize(ctx)  →  [ process(ctx) ]*  →  on_shutdown(ctx)
//! ```

use std::error::Error;
use std::fmt;

mod context;
mod pipeline;
mod port;

pub use context::StageContext;
pub use pipeline::{GraphError, Pipeline, PipelineBuilder};
pub use port::PortDecl;

/// Error type for stage operations.
#[derive(Debug)]
pub enum StageError {
    /// The stage has not been initialized yet.
    NotInitialized,
    /// A value the stage needs is absent from the context.
    InvalidContext {
        /// Type the stage expected.
        expected: &'static str,
        /// Description of what was found.
        received: String,
    },
    /// A domain-specific error occurred while processing a frame.
    ExecutionFailed(Box<dyn Error + Send + Sync>),
    /// A domain-specific error occurred during initialization.
    InitializationFailed(Box<dyn Error + Send + Sync>),
}

impl StageError {
    /// Convenience constructor for a missing context entry.
    pub fn missing(type_name: &'static str) -> Self {
        StageError::InvalidContext {
            expected: type_name,
            received: "not found in StageContext".into(),
        }
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageError::NotInitialized => write!(f, "Stage not initialized"),
            StageError::InvalidContext { expected, received } => {
                write!(f, "Invalid stage context: expected {expected}, got {received}")
            }
            StageError::ExecutionFailed(e) => write!(f, "Stage execution failed: {e}"),
            StageError::InitializationFailed(e) => write!(f, "Stage initialization failed: {e}"),
        }
    }
}

impl Error for StageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StageError::ExecutionFailed(e) | StageError::InitializationFailed(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// One step of a pipeline.
///
/// Stages own their GPU resources and are driven from a single thread, one
/// frame at a time, hence `&mut self` everywhere.
pub trait Stage: Send {
    /// Human-readable name, unique within a pipeline.
    fn name(&self) -> &'static str;

    /// Ports read by this stage.
    fn inputs(&self) -> Vec<PortDecl>;

    /// Ports written by this stage.
    fn outputs(&self) -> Vec<PortDecl>;

    /// Called once before the first frame. Default is a no-op.
    fn on_initialize(&mut self, _ctx: &mut StageContext) -> Result<(), StageError> {
        Ok(())
    }

    /// Called once per frame, after every producer of its inputs.
    fn process(&mut self, ctx: &mut StageContext) -> Result<(), StageError>;

    /// Called when the pipeline shuts down. Default is a no-op.
    fn on_shutdown(&mut self, _ctx: &mut StageContext) {}
}
