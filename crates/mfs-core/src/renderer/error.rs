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

//! Error types of the rendering layer.

use crate::renderer::api::{BindGroupLayoutId, PipelineLayoutId, RenderPipelineId, ShaderModuleId};
use std::fmt;

/// An error related to loading or compiling a shader module.
#[derive(Debug)]
pub enum ShaderError {
    /// The shader source could not be read.
    LoadError {
        /// The path that failed to load.
        path: String,
        /// The underlying I/O error, rendered.
        source_error: String,
    },
    /// The backend rejected the source.
    CompilationError {
        /// Label of the shader.
        label: String,
        /// Compiler output.
        details: String,
    },
    /// No shader module exists for the id.
    NotFound {
        /// The missing id.
        id: ShaderModuleId,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::LoadError { path, source_error } => {
                write!(f, "Failed to load shader source from '{path}': {source_error}")
            }
            ShaderError::CompilationError { label, details } => {
                write!(f, "Shader compilation failed for '{label}': {details}")
            }
            ShaderError::NotFound { id } => write!(f, "Shader module not found for ID: {id:?}"),
        }
    }
}

impl std::error::Error for ShaderError {}

/// An error related to building a render pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// A shader module referenced by the pipeline does not exist.
    InvalidShaderModuleForPipeline {
        /// The missing module.
        id: ShaderModuleId,
        /// Label of the pipeline being built.
        pipeline_label: Option<String>,
    },
    /// A fragment module was given without an entry point.
    MissingEntryPointForFragmentShader {
        /// Label of the pipeline being built.
        pipeline_label: Option<String>,
        /// The fragment module.
        shader_id: ShaderModuleId,
    },
    /// No pipeline layout exists for the id.
    InvalidPipelineLayout {
        /// The missing id.
        id: PipelineLayoutId,
    },
    /// No bind group layout exists for the id.
    InvalidBindGroupLayout {
        /// The missing id.
        id: BindGroupLayoutId,
    },
    /// No render pipeline exists for the id.
    InvalidRenderPipeline {
        /// The missing id.
        id: RenderPipelineId,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::InvalidShaderModuleForPipeline { id, pipeline_label } => write!(
                f,
                "Invalid shader module {:?} for pipeline '{}'",
                id,
                pipeline_label.as_deref().unwrap_or("Unknown")
            ),
            PipelineError::MissingEntryPointForFragmentShader {
                pipeline_label,
                shader_id,
            } => write!(
                f,
                "Missing fragment entry point in pipeline '{}', shader ID: {:?}",
                pipeline_label.as_deref().unwrap_or("Unknown"),
                shader_id
            ),
            PipelineError::InvalidPipelineLayout { id } => {
                write!(f, "Invalid pipeline layout ID: {id:?}")
            }
            PipelineError::InvalidBindGroupLayout { id } => {
                write!(f, "Invalid bind group layout ID: {id:?}")
            }
            PipelineError::InvalidRenderPipeline { id } => {
                write!(f, "Invalid render pipeline ID: {id:?}")
            }
        }
    }
}

impl std::error::Error for PipelineError {}

/// An error related to creating or using a GPU resource.
#[derive(Debug)]
pub enum ResourceError {
    /// A shader-specific error.
    Shader(ShaderError),
    /// A pipeline-specific error.
    Pipeline(PipelineError),
    /// No resource exists for the id.
    NotFound,
    /// The id refers to a resource of the wrong kind or a destroyed one.
    InvalidHandle,
    /// The backend failed.
    BackendError(String),
    /// Data did not match the size of the target resource.
    OutOfBounds,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Shader(err) => write!(f, "Shader resource error: {err}"),
            ResourceError::Pipeline(err) => write!(f, "Pipeline resource error: {err}"),
            ResourceError::NotFound => write!(f, "Resource not found with ID."),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle or ID."),
            ResourceError::BackendError(msg) => write!(f, "Backend-specific resource error: {msg}"),
            ResourceError::OutOfBounds => write!(f, "Resource access out of bounds."),
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Shader(err) => Some(err),
            ResourceError::Pipeline(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShaderError> for ResourceError {
    fn from(err: ShaderError) -> Self {
        ResourceError::Shader(err)
    }
}

impl From<PipelineError> for ResourceError {
    fn from(err: PipelineError) -> Self {
        ResourceError::Pipeline(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_shader_load_error_names_the_path() {
        let err = ShaderError::LoadError {
            path: "data/shaders/postprocessing.wgsl".to_string(),
            source_error: "No such file or directory".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to load shader source from 'data/shaders/postprocessing.wgsl': No such file or directory"
        );
    }

    #[test]
    fn test_resource_error_wraps_shader_error() {
        let res: ResourceError = ShaderError::NotFound {
            id: ShaderModuleId(7),
        }
        .into();
        assert_eq!(
            res.to_string(),
            "Shader resource error: Shader module not found for ID: ShaderModuleId(7)"
        );
        assert!(res.source().is_some());
    }

    #[test]
    fn test_resource_error_wraps_pipeline_error() {
        let res: ResourceError = PipelineError::InvalidPipelineLayout {
            id: PipelineLayoutId(3),
        }
        .into();
        assert!(res.to_string().contains("PipelineLayoutId(3)"));
        assert!(res.source().is_some());
        assert!(ResourceError::NotFound.source().is_none());
    }
}
