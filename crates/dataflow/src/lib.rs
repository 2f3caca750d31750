//! Dataflow - stream and composed task definitions.
//!
//! This library turns definition text into what a data pipeline platform
//! stores and runs: app definitions for streams and executable graphs for
//! composed tasks. It also renders both back into text, optionally with
//! secrets redacted.

pub mod config;
pub mod definition;
pub mod dsl;
pub mod sanitize;

mod error;

pub use dataflow_dsl::{ast, graph};

pub use error::DataflowError;

use log::{debug, info, trace};
use serde::Serialize;

use dataflow_dsl::{
    ast::{StreamNode, TaskNode},
    error::Diagnostic,
    graph::Graph,
    parse_stream, parse_task, validate_task,
};

use config::AppConfig;
use definition::{StreamAppDefinition, StreamAppDefinitionBuilder, build_app_definitions};

/// Entry point for processing stream and task definitions.
///
/// # Examples
///
/// ```
/// use dataflow::{DefinitionService, config::AppConfig};
///
/// let service = DefinitionService::new(AppConfig::default());
///
/// let apps = service.app_definitions("ticktock", "time | log")
///     .expect("Failed to parse stream");
/// assert_eq!(apps.len(), 2);
///
/// let graph = service.task_graph(None, "extract && <clean || index>")
///     .expect("Failed to build graph");
/// assert_eq!(graph.nodes.len(), 5);
/// ```
#[derive(Debug, Default)]
pub struct DefinitionService {
    config: AppConfig,
}

impl DefinitionService {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse a stream definition registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns `DataflowError::Parse` with the first syntax error.
    pub fn parse_stream(&self, name: &str, dsl: &str) -> Result<StreamNode, DataflowError> {
        debug!(stream = name; "Parsing stream definition");
        parse_stream(Some(name), dsl).map_err(|err| DataflowError::new_parse_error(err, dsl))
    }

    /// The app definitions of a stream, source first.
    ///
    /// # Errors
    ///
    /// Returns `DataflowError::Parse` if the definition does not parse.
    pub fn app_definitions(
        &self,
        name: &str,
        dsl: &str,
    ) -> Result<Vec<StreamAppDefinition>, DataflowError> {
        let stream = self.parse_stream(name, dsl)?;
        let definitions = build_app_definitions(name, &stream);
        info!(stream = name, apps = definitions.len(); "Stream app definitions built");
        trace!(definitions:?; "App definitions");
        Ok(definitions)
    }

    /// The app definitions in the order they are deployed: sink first,
    /// source last.
    ///
    /// # Errors
    ///
    /// Returns `DataflowError::Parse` if the definition does not parse.
    pub fn deployment_order(
        &self,
        name: &str,
        dsl: &str,
    ) -> Result<Vec<StreamAppDefinition>, DataflowError> {
        let mut definitions = self.app_definitions(name, dsl)?;
        definitions.reverse();
        Ok(definitions)
    }

    /// The stream definition rebuilt from its app definitions.
    ///
    /// # Errors
    ///
    /// Returns `DataflowError::Parse` if the definition does not parse.
    pub fn stream_dsl(&self, name: &str, dsl: &str) -> Result<String, DataflowError> {
        Ok(dsl::stream_to_dsl(&self.app_definitions(name, dsl)?))
    }

    /// The app definitions of a stream with sensitive property values
    /// redacted.
    ///
    /// # Errors
    ///
    /// Returns `DataflowError::Parse` if the definition does not parse.
    pub fn sanitized_app_definitions(
        &self,
        name: &str,
        dsl: &str,
    ) -> Result<Vec<StreamAppDefinition>, DataflowError> {
        Ok(self
            .app_definitions(name, dsl)?
            .iter()
            .map(|app| {
                StreamAppDefinitionBuilder::from_definition(app)
                    .properties(sanitize::sanitize_properties(app.properties()))
                    .build(name)
            })
            .collect())
    }

    /// The stream definition with sensitive property values redacted.
    ///
    /// # Errors
    ///
    /// Returns `DataflowError::Parse` if the definition does not parse.
    pub fn sanitize_stream_dsl(&self, name: &str, dsl: &str) -> Result<String, DataflowError> {
        let sanitized = self.sanitized_app_definitions(name, dsl)?;
        info!(stream = name; "Stream definition sanitized");
        Ok(dsl::stream_to_dsl(&sanitized))
    }

    /// Parse a task definition with the configured parser switches.
    ///
    /// # Errors
    ///
    /// Returns `DataflowError::Parse` with the first syntax error, or with
    /// every validation error when validation is enabled.
    pub fn parse_task(&self, name: Option<&str>, dsl: &str) -> Result<TaskNode, DataflowError> {
        let parser = self.config.parser();
        debug!(
            task = name.unwrap_or_default(),
            validate = parser.validate(),
            in_app_mode = parser.in_app_mode();
            "Parsing task definition"
        );
        parse_task(name, dsl, parser.in_app_mode(), parser.validate())
            .map_err(|err| DataflowError::new_parse_error(err, dsl))
    }

    /// The executable graph of a task definition.
    ///
    /// # Errors
    ///
    /// Returns `DataflowError::Parse` if the definition does not parse and
    /// `DataflowError::Graph` if it cannot be lowered.
    pub fn task_graph(&self, name: Option<&str>, dsl: &str) -> Result<Graph, DataflowError> {
        let graph = self.parse_task(name, dsl)?.to_graph()?;
        info!(
            task = name.unwrap_or_default(),
            nodes = graph.nodes.len(),
            links = graph.links.len();
            "Task graph built"
        );
        Ok(graph)
    }

    /// The task definition with sensitive app arguments redacted, rendered
    /// from its graph.
    ///
    /// # Errors
    ///
    /// Returns `DataflowError::Parse` or `DataflowError::Graph` when the
    /// definition cannot be parsed or lowered.
    pub fn sanitize_task_dsl(&self, name: Option<&str>, dsl: &str) -> Result<String, DataflowError> {
        if dsl.trim().is_empty() {
            return Ok(dsl.to_string());
        }
        let task = parse_task(name, dsl, true, true)
            .map_err(|err| DataflowError::new_parse_error(err, dsl))?;
        let mut graph = task.to_graph()?;
        for node in &mut graph.nodes {
            for (key, value) in node.properties.iter_mut() {
                *value = dsl::auto_quotes(&sanitize::sanitize(key, value));
            }
        }
        info!(task = name.unwrap_or_default(); "Task definition sanitized");
        Ok(graph.to_dsl_text()?)
    }

    /// Parse and validate a definition, returning the warnings found.
    ///
    /// # Errors
    ///
    /// Returns `DataflowError::Parse` with every error found.
    pub fn check_task(&self, name: Option<&str>, dsl: &str) -> Result<Vec<Diagnostic>, DataflowError> {
        let task = parse_task(name, dsl, self.config.parser().in_app_mode(), true)
            .map_err(|err| DataflowError::new_parse_error(err, dsl))?;
        Ok(validate_task(&task))
    }

    /// Serialize a value as JSON, pretty printed if configured.
    ///
    /// # Errors
    ///
    /// Returns `DataflowError::Json` if serialization fails.
    pub fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, DataflowError> {
        let json = if self.config.output().pretty() {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json)
    }
}
