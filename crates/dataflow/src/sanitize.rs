//! Redaction of secrets in arguments and properties.
//!
//! A value is sensitive when its key ends with one of [`SENSITIVE_SUFFIXES`]
//! or contains `credentials`, ignoring case. Sensitive values that are not
//! blank are replaced with [`REDACTED`].

use indexmap::IndexMap;
use serde_json::Value;

/// What sensitive values are replaced with.
pub const REDACTED: &str = "******";

/// Key endings that mark a value as sensitive.
pub const SENSITIVE_SUFFIXES: [&str; 7] = [
    "username",
    "password",
    "secret",
    "key",
    "token",
    "vcap_services",
    "url",
];

const SENSITIVE_INFIX: &str = "credentials";

/// Whether values stored under `key` must not be shown.
pub fn is_sensitive(key: &str) -> bool {
    let key = key.to_lowercase();
    key.contains(SENSITIVE_INFIX) || SENSITIVE_SUFFIXES.iter().any(|suffix| key.ends_with(suffix))
}

/// The value to show for `key`.
pub fn sanitize(key: &str, value: &str) -> String {
    if !value.trim().is_empty() && is_sensitive(key) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}

/// Sanitize a `key=value` argument such as `--password=secret`. Arguments
/// without `=` are returned unchanged.
pub fn sanitize_argument(argument: &str) -> String {
    match argument.split_once('=') {
        Some((key, value)) => format!("{key}={}", sanitize(key, value)),
        None => argument.to_string(),
    }
}

pub fn sanitize_arguments<S: AsRef<str>>(arguments: &[S]) -> Vec<String> {
    arguments
        .iter()
        .map(|argument| sanitize_argument(argument.as_ref()))
        .collect()
}

pub fn sanitize_properties(properties: &IndexMap<String, String>) -> IndexMap<String, String> {
    properties
        .iter()
        .map(|(key, value)| (key.clone(), sanitize(key, value)))
        .collect()
}

/// Sanitize every string held by a sensitive key, at any depth of nested
/// objects.
pub fn sanitize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let value = match value {
                        Value::String(text) => Value::String(sanitize(key, text)),
                        other => sanitize_json(other),
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [&str; 6] = ["password", "secret", "key", "token", "vcap_services", "url"];

    #[test]
    fn test_sanitize_keys() {
        for key in KEYS {
            assert_eq!(sanitize_argument(&format!("--{key}=foo")), format!("--{key}=******"));
            assert_eq!(sanitize(key, "bar"), REDACTED);
        }
        assert_eq!(sanitize("aws.credentials.file", "x"), REDACTED);
        assert_eq!(sanitize("spring.datasource.URL", "jdbc:h2"), REDACTED);
        assert_eq!(sanitize("name", "bar"), "bar");
    }

    #[test]
    fn test_blank_values_are_kept() {
        assert_eq!(sanitize("password", ""), "");
        assert_eq!(sanitize("password", "  "), "  ");
    }

    #[test]
    fn test_sanitize_arguments() {
        let arguments: Vec<String> = KEYS.iter().map(|key| format!("--{key}=foo")).collect();
        let sanitized = sanitize_arguments(&arguments);

        assert_eq!(sanitized.len(), KEYS.len());
        for (key, argument) in KEYS.iter().zip(&sanitized) {
            assert_eq!(argument, &format!("--{key}=******"));
        }
        assert_eq!(sanitize_arguments(&["--verbose"]), vec!["--verbose"]);
    }

    #[test]
    fn test_multipart_keys() {
        assert_eq!(sanitize_argument("--password=boza"), "--password=******");
        assert_eq!(sanitize_argument("--one.two.password=boza"), "--one.two.password=******");
        assert_eq!(sanitize_argument("--one_two_password=boza"), "--one_two_password=******");
    }

    #[test]
    fn test_sanitize_properties() {
        let properties = IndexMap::from([
            ("user".to_string(), "bob".to_string()),
            ("db.password".to_string(), "hunter2".to_string()),
        ]);
        let sanitized = sanitize_properties(&properties);

        assert_eq!(sanitized["user"], "bob");
        assert_eq!(sanitized["db.password"], REDACTED);
        assert_eq!(sanitized.keys().collect::<Vec<_>>(), vec!["user", "db.password"]);
    }

    #[test]
    fn test_sanitize_json() {
        let input = serde_json::json!({
            "name": "app",
            "port": 8080,
            "datasource": {"url": "jdbc:mysql://db", "password": "54321"},
        });
        let output = sanitize_json(&input);

        assert_eq!(output["name"], "app");
        assert_eq!(output["port"], 8080);
        assert_eq!(output["datasource"]["url"], REDACTED);
        assert_eq!(output["datasource"]["password"], REDACTED);
        assert!(!output.to_string().contains("54321"));
    }
}
