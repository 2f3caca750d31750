//! App definitions of a stream.
//!
//! A parsed stream becomes one [`StreamAppDefinition`] per app, in pipeline
//! order. Each carries the app's arguments as properties plus the binding
//! properties that wire it to its neighbours: an app reads from
//! `{stream}.{previous label}` and writes to `{stream}.{own label}`, with
//! the stream name as consumer group. Named source and sink destinations
//! replace the binding at their end of the pipeline.

use std::fmt;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use dataflow_dsl::ast::StreamNode;

/// Property keys set on app definitions.
pub mod keys {
    pub const INPUT_DESTINATION: &str = "spring.cloud.stream.bindings.input.destination";
    pub const INPUT_GROUP: &str = "spring.cloud.stream.bindings.input.group";
    pub const INPUT_CONTENT_TYPE: &str = "spring.cloud.stream.bindings.input.contentType";
    pub const OUTPUT_DESTINATION: &str = "spring.cloud.stream.bindings.output.destination";
    pub const OUTPUT_REQUIRED_GROUPS: &str =
        "spring.cloud.stream.bindings.output.producer.requiredGroups";
    pub const OUTPUT_CONTENT_TYPE: &str = "spring.cloud.stream.bindings.output.contentType";

    pub const STREAM_APP_TYPE: &str = "spring.cloud.dataflow.stream.app.type";
    pub const STREAM_APP_LABEL: &str = "spring.cloud.dataflow.stream.app.label";
    pub const STREAM_NAME: &str = "spring.cloud.dataflow.stream.name";

    pub const METRICS_KEY: &str = "spring.cloud.stream.metrics.key";
    pub const METRICS_PROPERTIES: &str = "spring.cloud.stream.metrics.properties";
    pub const METRICS_TRIGGER_INCLUDES: &str = "spring.cloud.stream.metrics.trigger-includes";

    /// Keys the platform derives itself and that never appear in definition text.
    pub const PLATFORM_ADDED: [&str; 10] = [
        STREAM_APP_TYPE,
        STREAM_APP_LABEL,
        STREAM_NAME,
        METRICS_TRIGGER_INCLUDES,
        METRICS_KEY,
        METRICS_PROPERTIES,
        INPUT_GROUP,
        OUTPUT_REQUIRED_GROUPS,
        OUTPUT_DESTINATION,
        INPUT_DESTINATION,
    ];
}

/// The role an app plays in a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationType {
    /// An app of an unbound stream, not wired to its neighbours.
    App,
    Source,
    Processor,
    Sink,
    Task,
}

impl fmt::Display for ApplicationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApplicationType::App => "app",
            ApplicationType::Source => "source",
            ApplicationType::Processor => "processor",
            ApplicationType::Sink => "sink",
            ApplicationType::Task => "task",
        };
        f.write_str(name)
    }
}

/// One app of a stream, ready to be stored or deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamAppDefinition {
    registered_app_name: String,
    /// The label, or the registered name when the app has none.
    name: String,
    stream_name: String,
    application_type: ApplicationType,
    properties: IndexMap<String, String>,
}

impl StreamAppDefinition {
    pub fn builder(registered_app_name: impl Into<String>) -> StreamAppDefinitionBuilder {
        StreamAppDefinitionBuilder::new(registered_app_name)
    }

    pub fn registered_app_name(&self) -> &str {
        &self.registered_app_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    pub fn application_type(&self) -> ApplicationType {
        self.application_type
    }

    pub fn properties(&self) -> &IndexMap<String, String> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Builder for [`StreamAppDefinition`].
///
/// # Example
///
/// ```
/// # use dataflow::definition::{ApplicationType, StreamAppDefinition};
/// let app = StreamAppDefinition::builder("filter")
///     .label("f")
///     .application_type(ApplicationType::Processor)
///     .property("expression", "true")
///     .build("ticktock");
///
/// assert_eq!(app.name(), "f");
/// assert_eq!(app.property("expression"), Some("true"));
/// ```
#[derive(Debug, Clone)]
pub struct StreamAppDefinitionBuilder {
    registered_app_name: String,
    label: Option<String>,
    application_type: ApplicationType,
    properties: IndexMap<String, String>,
}

impl StreamAppDefinitionBuilder {
    pub fn new(registered_app_name: impl Into<String>) -> Self {
        Self {
            registered_app_name: registered_app_name.into(),
            label: None,
            application_type: ApplicationType::App,
            properties: IndexMap::new(),
        }
    }

    /// Start from an existing definition, keeping its label and properties.
    pub fn from_definition(definition: &StreamAppDefinition) -> Self {
        Self {
            registered_app_name: definition.registered_app_name.clone(),
            label: Some(definition.name.clone()),
            application_type: definition.application_type,
            properties: definition.properties.clone(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn application_type(mut self, application_type: ApplicationType) -> Self {
        self.application_type = application_type;
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Replace every property.
    pub fn properties(mut self, properties: IndexMap<String, String>) -> Self {
        self.properties = properties;
        self
    }

    pub fn build(self, stream_name: impl Into<String>) -> StreamAppDefinition {
        StreamAppDefinition {
            name: self
                .label
                .unwrap_or_else(|| self.registered_app_name.clone()),
            registered_app_name: self.registered_app_name,
            stream_name: stream_name.into(),
            application_type: self.application_type,
            properties: self.properties,
        }
    }
}

/// Turn a parsed stream into its app definitions, source first.
pub fn build_app_definitions(stream_name: &str, stream: &StreamNode) -> Vec<StreamAppDefinition> {
    let apps = stream.apps();
    let has_source = stream.source.is_some();
    let has_sink = stream.sink.is_some();
    let last = apps.len().saturating_sub(1);

    let mut definitions = Vec::with_capacity(apps.len());
    for (index, app) in apps.iter().enumerate() {
        let mut builder = StreamAppDefinition::builder(app.name()).label(app.label_name());

        for arg in &app.arguments {
            builder = if arg.name.eq_ignore_ascii_case("inputType") {
                builder.property(keys::INPUT_CONTENT_TYPE, &arg.value)
            } else if arg.name.eq_ignore_ascii_case("outputType") {
                builder.property(keys::OUTPUT_CONTENT_TYPE, &arg.value)
            } else {
                builder.property(&arg.name, &arg.value)
            };
        }

        let application_type = if app.unbound {
            ApplicationType::App
        } else if apps.len() == 1 {
            match (has_source, has_sink) {
                (true, true) => ApplicationType::Processor,
                (true, false) => ApplicationType::Sink,
                (false, true) => ApplicationType::Source,
                (false, false) => ApplicationType::App,
            }
        } else if index == 0 {
            if has_source {
                ApplicationType::Processor
            } else {
                ApplicationType::Source
            }
        } else if index == last {
            if has_sink {
                ApplicationType::Processor
            } else {
                ApplicationType::Sink
            }
        } else {
            ApplicationType::Processor
        };
        builder = builder.application_type(application_type);

        if !app.unbound {
            if index > 0 {
                let previous = apps[index - 1].label_name();
                builder = builder
                    .property(keys::INPUT_DESTINATION, format!("{stream_name}.{previous}"))
                    .property(keys::INPUT_GROUP, stream_name);
            }
            if index < last {
                builder = builder
                    .property(
                        keys::OUTPUT_DESTINATION,
                        format!("{stream_name}.{}", app.label_name()),
                    )
                    .property(keys::OUTPUT_REQUIRED_GROUPS, stream_name);
            }
        }

        if index == 0
            && let Some(source) = &stream.source
        {
            let group = source
                .arguments
                .iter()
                .find(|arg| arg.name.eq_ignore_ascii_case("group"))
                .map(|arg| arg.value.clone())
                .filter(|group| !group.trim().is_empty())
                .unwrap_or_else(|| stream_name.to_string());
            builder = builder
                .property(keys::INPUT_DESTINATION, source.name())
                .property(keys::INPUT_GROUP, group);
        }
        if index == last
            && let Some(sink) = &stream.sink
        {
            builder = builder.property(keys::OUTPUT_DESTINATION, sink.name());
        }

        definitions.push(builder.build(stream_name));
    }

    debug!(stream = stream_name, apps = definitions.len(); "Built app definitions");
    definitions
}
