//! Stream definition text from app definitions.
//!
//! [`stream_to_dsl`] is the inverse of parsing plus
//! [`build_app_definitions`](crate::definition::build_app_definitions):
//! parsing its output yields the same app definitions.

use crate::definition::{ApplicationType, StreamAppDefinition, keys};

const BRIDGE_APP: &str = "bridge";

/// Characters that force a property value into quotes.
const NEEDS_QUOTES: [char; 4] = [' ', ';', '*', '|'];

/// Render app definitions, in pipeline order, as stream definition text.
///
/// # Example
///
/// ```
/// # use dataflow::{definition::build_app_definitions, dsl::stream_to_dsl};
/// # use dataflow_dsl::parse_stream;
/// let stream = parse_stream(Some("s"), ":orders > filter --expression=true | log").unwrap();
/// let apps = build_app_definitions("s", &stream);
///
/// assert_eq!(stream_to_dsl(&apps), ":orders > filter --expression=true | log");
/// ```
pub fn stream_to_dsl(definitions: &[StreamAppDefinition]) -> String {
    if let [app] = definitions
        && app.registered_app_name() == BRIDGE_APP
        && app.name() == BRIDGE_APP
        && let (Some(input), Some(output)) = (
            non_blank(app.property(keys::INPUT_DESTINATION)),
            non_blank(app.property(keys::OUTPUT_DESTINATION)),
        )
    {
        let mut dsl = source_destination(app, input);
        dsl.push(':');
        dsl.push_str(output);
        return dsl;
    }

    let mut dsl = String::new();
    let last = definitions.len().saturating_sub(1);
    for (index, app) in definitions.iter().enumerate() {
        if index == 0
            && let Some(input) = non_blank(app.property(keys::INPUT_DESTINATION))
        {
            dsl.push_str(&source_destination(app, input));
        }

        dsl.push_str(app.name());
        if app.name() != app.registered_app_name() {
            dsl.push_str(": ");
            dsl.push_str(app.registered_app_name());
        }

        for (key, value) in app.properties() {
            if keys::PLATFORM_ADDED.contains(&key.as_str()) {
                continue;
            }
            dsl.push_str(&format!(" --{key}={}", escape_newlines(&auto_quotes(value))));
        }

        if index == last {
            if let Some(output) = non_blank(app.property(keys::OUTPUT_DESTINATION)) {
                dsl.push_str(" > :");
                dsl.push_str(output);
            }
        } else if app.application_type() == ApplicationType::App {
            dsl.push_str(" || ");
        } else {
            dsl.push_str(" | ");
        }
    }
    dsl
}

/// `:destination > `, with the consumer group when it is not the default.
fn source_destination(app: &StreamAppDefinition, input: &str) -> String {
    let mut dsl = format!(":{input}");
    if let Some(group) = app.property(keys::INPUT_GROUP)
        && group != app.stream_name()
    {
        dsl.push_str(&format!(" --group={group}"));
    }
    dsl.push_str(" > ");
    dsl
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Quote a property value so it reads back as one argument.
///
/// Values containing a space, `;`, `*` or `|` are wrapped in single quotes,
/// or in double quotes when they contain a single quote themselves. Values
/// already in double quotes are left alone.
pub fn auto_quotes(value: &str) -> String {
    if value.trim().is_empty() || !value.contains(NEEDS_QUOTES) {
        return value.to_string();
    }
    if value.len() > 1 && value.starts_with('"') && value.ends_with('"') {
        return value.to_string();
    }
    if value.contains('\'') {
        format!("\"{value}\"")
    } else {
        format!("'{value}'")
    }
}

/// Replace line breaks with their escape sequences.
pub fn escape_newlines(value: &str) -> String {
    value.replace('\r', "\\r").replace('\n', "\\n")
}
