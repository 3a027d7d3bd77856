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
use std::fmt;

use super::{PortDecl, Stage, StageContext, StageError};
use crate::graph::topological_sort;

/// A wiring error detected while building a [`Pipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A required input has no producer.
    MissingProducer {
        /// Consuming stage.
        stage: &'static str,
        /// Unconnected port.
        port: &'static str,
    },
    /// Producer and consumer disagree on the value type.
    TypeMismatch {
        /// Consuming stage.
        stage: &'static str,
        /// Port name.
        port: &'static str,
        /// Type the consumer reads.
        expected: &'static str,
        /// Type the producer writes.
        found: &'static str,
    },
    /// Two producers write the same port.
    DuplicateProducer {
        /// Port name.
        port: &'static str,
    },
    /// Stage dependencies form a cycle.
    Cycle,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::MissingProducer { stage, port } => {
                write!(f, "Input '{port}' of stage '{stage}' has no producer")
            }
            GraphError::TypeMismatch {
                stage,
                port,
                expected,
                found,
            } => write!(
                f,
                "Input '{port}' of stage '{stage}' expects {expected}, producer writes {found}"
            ),
            GraphError::DuplicateProducer { port } => {
                write!(f, "Port '{port}' has more than one producer")
            }
            GraphError::Cycle => write!(f, "Stage dependencies form a cycle"),
        }
    }
}

impl std::error::Error for GraphError {}

#[derive(Clone, Copy)]
enum Producer {
    Host,
    Stage(usize),
}

/// Collects stages and host-provided ports, then checks and orders them.
pub struct PipelineBuilder {
    name: String,
    external: Vec<PortDecl>,
    stages: Vec<Box<dyn Stage>>,
}

impl PipelineBuilder {
    /// Starts an empty pipeline.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            external: Vec::new(),
            stages: Vec::new(),
        }
    }

    /// Declares a port the host publishes before each frame.
    pub fn external_input(mut self, port: PortDecl) -> Self {
        self.external.push(port);
        self
    }

    /// Adds a stage. Insertion order only breaks ties between independent
    /// stages.
    pub fn add_stage(mut self, stage: Box<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Connects every input to its producer and orders the stages.
    pub fn build(self) -> Result<Pipeline, GraphError> {
        let mut producers: HashMap<&'static str, (Producer, PortDecl)> = HashMap::new();
        let mut register = |port: PortDecl, producer: Producer| {
            if producers.insert(port.name, (producer, port)).is_some() {
                Err(GraphError::DuplicateProducer { port: port.name })
            } else {
                Ok(())
            }
        };

        for port in &self.external {
            register(*port, Producer::Host)?;
        }
        for (index, stage) in self.stages.iter().enumerate() {
            for port in stage.outputs() {
                register(port, Producer::Stage(index))?;
            }
        }

        let mut edges = Vec::new();
        for (index, stage) in self.stages.iter().enumerate() {
            for input in stage.inputs() {
                let Some((producer, output)) = producers.get(input.name) else {
                    if input.optional {
                        log::debug!(
                            "Optional input '{}' of stage '{}' left unconnected",
                            input.name,
                            stage.name()
                        );
                        continue;
                    }
                    return Err(GraphError::MissingProducer {
                        stage: stage.name(),
                        port: input.name,
                    });
                };
                if !input.same_type(output) {
                    return Err(GraphError::TypeMismatch {
                        stage: stage.name(),
                        port: input.name,
                        expected: input.type_name,
                        found: output.type_name,
                    });
                }
                if let Producer::Stage(from) = producer {
                    edges.push((*from, index));
                }
            }
        }

        let order = topological_sort(0..self.stages.len(), edges).map_err(|_| GraphError::Cycle)?;

        let mut slots: Vec<Option<Box<dyn Stage>>> = self.stages.into_iter().map(Some).collect();
        let stages: Vec<Box<dyn Stage>> = order
            .into_iter()
            .filter_map(|index| slots[index].take())
            .collect();

        log::info!(
            "Pipeline '{}' built: {}",
            self.name,
            stages.iter().map(|s| s.name()).collect::<Vec<_>>().join(" -> ")
        );

        Ok(Pipeline {
            name: self.name,
            stages,
        })
    }
}

/// An ordered, validated list of stages.
pub struct Pipeline {
    name: String,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// The pipeline name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Initializes every stage in order.
    ///
    /// When a stage fails, the stages initialized before it are shut down
    /// again in reverse order and the error is returned.
    pub fn initialize(&mut self, ctx: &mut StageContext) -> Result<(), StageError> {
        for index in 0..self.stages.len() {
            let stage = &mut self.stages[index];
            log::debug!("Initializing stage '{}'", stage.name());
            if let Err(e) = stage.on_initialize(ctx) {
                log::error!("Stage '{}' failed to initialize: {}", stage.name(), e);
                for initialized in self.stages[..index].iter_mut().rev() {
                    initialized.on_shutdown(ctx);
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Runs one frame through every stage, then clears the change flags.
    pub fn process_frame(&mut self, ctx: &mut StageContext) -> Result<(), StageError> {
        for stage in &mut self.stages {
            stage.process(ctx).map_err(|e| {
                log::error!("Stage '{}' failed: {}", stage.name(), e);
                e
            })?;
        }
        ctx.clear_changes();
        Ok(())
    }

    /// Shuts every stage down, last first.
    pub fn shutdown(&mut self, ctx: &mut StageContext) {
        for stage in self.stages.iter_mut().rev() {
            log::debug!("Shutting down stage '{}'", stage.name());
            stage.on_shutdown(ctx);
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Journal = Arc<Mutex<Vec<String>>>;

    struct StubStage {
        name: &'static str,
        inputs: Vec<PortDecl>,
        outputs: Vec<PortDecl>,
        journal: Journal,
        fail_init: bool,
    }

    impl StubStage {
        fn new(name: &'static str, journal: &Journal) -> Self {
            Self {
                name,
                inputs: Vec::new(),
                outputs: Vec::new(),
                journal: journal.clone(),
                fail_init: false,
            }
        }

        fn reads(mut self, port: PortDecl) -> Self {
            self.inputs.push(port);
            self
        }

        fn writes(mut self, port: PortDecl) -> Self {
            self.outputs.push(port);
            self
        }

        fn log(&self, event: &str) {
            if let Ok(mut journal) = self.journal.lock() {
                journal.push(format!("{}:{}", event, self.name));
            }
        }
    }

    impl Stage for StubStage {
        fn name(&self) -> &'static str {
            self.name
        }
        fn inputs(&self) -> Vec<PortDecl> {
            self.inputs.clone()
        }
        fn outputs(&self) -> Vec<PortDecl> {
            self.outputs.clone()
        }
        fn on_initialize(&mut self, _ctx: &mut StageContext) -> Result<(), StageError> {
            self.log("init");
            if self.fail_init {
                return Err(StageError::NotInitialized);
            }
            Ok(())
        }
        fn process(&mut self, _ctx: &mut StageContext) -> Result<(), StageError> {
            self.log("process");
            Ok(())
        }
        fn on_shutdown(&mut self, _ctx: &mut StageContext) {
            self.log("shutdown");
        }
    }

    fn entries(journal: &Journal) -> Vec<String> {
        journal.lock().map(|j| j.clone()).unwrap_or_default()
    }

    #[test]
    fn test_stages_are_ordered_by_dependencies() {
        let journal = Journal::default();
        let pipeline = PipelineBuilder::new("test")
            .external_input(PortDecl::required::<u32>("size"))
            .add_stage(Box::new(
                StubStage::new("blit", &journal).reads(PortDecl::required::<f32>("frame")),
            ))
            .add_stage(Box::new(
                StubStage::new("draw", &journal)
                    .reads(PortDecl::required::<u32>("size"))
                    .writes(PortDecl::required::<f32>("frame")),
            ))
            .build()
            .unwrap();

        assert_eq!(pipeline.stage_names(), vec!["draw", "blit"]);
        assert_eq!(pipeline.name(), "test");
    }

    #[test]
    fn test_missing_producer() {
        let journal = Journal::default();
        let result = PipelineBuilder::new("test")
            .add_stage(Box::new(
                StubStage::new("blit", &journal).reads(PortDecl::required::<f32>("frame")),
            ))
            .build();

        assert_eq!(
            result.err(),
            Some(GraphError::MissingProducer {
                stage: "blit",
                port: "frame"
            })
        );
    }

    #[test]
    fn test_optional_input_may_stay_unconnected() {
        let journal = Journal::default();
        let result = PipelineBuilder::new("test")
            .add_stage(Box::new(
                StubStage::new("post", &journal).reads(PortDecl::optional::<f32>("mask")),
            ))
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_type_mismatch() {
        let journal = Journal::default();
        let result = PipelineBuilder::new("test")
            .external_input(PortDecl::required::<u32>("size"))
            .add_stage(Box::new(
                StubStage::new("draw", &journal).reads(PortDecl::required::<f32>("size")),
            ))
            .build();

        assert!(matches!(
            result.err(),
            Some(GraphError::TypeMismatch { port: "size", .. })
        ));
    }

    #[test]
    fn test_duplicate_producer() {
        let journal = Journal::default();
        let result = PipelineBuilder::new("test")
            .external_input(PortDecl::required::<u32>("size"))
            .add_stage(Box::new(
                StubStage::new("draw", &journal).writes(PortDecl::required::<u32>("size")),
            ))
            .build();

        assert_eq!(
            result.err(),
            Some(GraphError::DuplicateProducer { port: "size" })
        );
    }

    #[test]
    fn test_cycle() {
        let journal = Journal::default();
        let result = PipelineBuilder::new("test")
            .add_stage(Box::new(
                StubStage::new("a", &journal)
                    .reads(PortDecl::required::<u32>("b_out"))
                    .writes(PortDecl::required::<u32>("a_out")),
            ))
            .add_stage(Box::new(
                StubStage::new("b", &journal)
                    .reads(PortDecl::required::<u32>("a_out"))
                    .writes(PortDecl::required::<u32>("b_out")),
            ))
            .build();

        assert_eq!(result.err(), Some(GraphError::Cycle));
    }

    #[test]
    fn test_lifecycle_order_and_change_flags() {
        let journal = Journal::default();
        let mut pipeline = PipelineBuilder::new("test")
            .add_stage(Box::new(
                StubStage::new("first", &journal).writes(PortDecl::required::<u32>("x")),
            ))
            .add_stage(Box::new(
                StubStage::new("second", &journal).reads(PortDecl::required::<u32>("x")),
            ))
            .build()
            .unwrap();

        let mut ctx = StageContext::new();
        ctx.insert(1u32);
        pipeline.initialize(&mut ctx).unwrap();
        pipeline.process_frame(&mut ctx).unwrap();
        assert!(!ctx.has_changed::<u32>());
        pipeline.shutdown(&mut ctx);

        assert_eq!(
            entries(&journal),
            vec![
                "init:first",
                "init:second",
                "process:first",
                "process:second",
                "shutdown:second",
                "shutdown:first",
            ]
        );
    }

    #[test]
    fn test_failed_initialize_unwinds() {
        let journal = Journal::default();
        let mut failing = StubStage::new("second", &journal);
        failing.fail_init = true;
        let mut pipeline = PipelineBuilder::new("test")
            .add_stage(Box::new(StubStage::new("first", &journal)))
            .add_stage(Box::new(failing))
            .add_stage(Box::new(StubStage::new("third", &journal)))
            .build()
            .unwrap();

        let mut ctx = StageContext::new();
        assert!(pipeline.initialize(&mut ctx).is_err());
        assert_eq!(
            entries(&journal),
            vec!["init:first", "init:second", "shutdown:first"]
        );
    }
}
