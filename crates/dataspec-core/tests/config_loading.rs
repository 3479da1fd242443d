//! Checking a realistic YAML configuration with a discriminated section.

use std::sync::Once;

use dataspec_core::prelude::*;
use dataspec_core::Issue;
use pretty_assertions::assert_eq;

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dataspec_core=trace")),
            )
            .with_test_writer()
            .try_init();
    });
}

fn lowercase(value: Value) -> Result<Value, CanonicalizeError> {
    match value.as_str() {
        Some(s) => Ok(Value::from(s.to_lowercase())),
        None => Err(CanonicalizeError::wrong_type("expected a string")),
    }
}

fn config_spec() -> Spec {
    let name = Type::new(Kind::Str).canonicalize(lowercase).build().unwrap();
    let port = Type::new(Kind::Int)
        .constraint(
            |v| v.as_i64().is_some_and(|p| (1..=65535).contains(&p)),
            "Must be in port number range 1-65535",
        )
        .build()
        .unwrap();

    let backend = ConditionalDictSpec::new()
        .case(
            "http",
            Descriptor::mapping([
                ("url", Descriptor::from(Kind::Str)),
                (
                    "retries",
                    Type::new(Kind::Int).optional(true).default(3).build().unwrap().into(),
                ),
            ]),
        )
        .case("static", Descriptor::mapping([("root", Kind::Str)]))
        .optional(true)
        .default("static")
        .apply_default_spec(true)
        .build()
        .unwrap();

    let server = DictSpec::new()
        .key("name", name.clone())
        .key("port", port)
        .conditional_key("backend", backend)
        .key(
            "headers",
            DictSpec::new()
                .type_key(name, Kind::Str)
                .auto_optional(true)
                .build()
                .unwrap(),
        )
        .name("server")
        .build()
        .unwrap();

    DictSpec::new()
        .key("servers", IterSpec::new(server).build().unwrap())
        .key(
            "log_level",
            EnumSpec::new(["debug", "info", "warn"])
                .optional(true)
                .default("info")
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
}

const VALID: &str = r#"
servers:
  - name: Web
    port: 8080
    backend: http
    url: http://upstream
    headers:
      X-Frame-Options: DENY
  - name: assets
    port: 8081
    root: /srv/www
"#;

#[test]
fn test_valid_config_is_canonicalized() {
    init_tracing();
    let raw: Value = serde_yaml::from_str(VALID).unwrap();
    let checked = config_spec().check_value(&raw).unwrap();

    let expected: Value = serde_json::json!({
        "log_level": "info",
        "servers": [
            {
                "name": "web",
                "port": 8080,
                "backend": "http",
                "url": "http://upstream",
                "retries": 3,
                "headers": {"x-frame-options": "DENY"}
            },
            {
                "name": "assets",
                "port": 8081,
                "backend": "static",
                "root": "/srv/www",
                "headers": {}
            }
        ]
    })
    .into();
    assert_eq!(checked, expected);
}

const INVALID: &str = r#"
servers:
  - name: web
    port: 0
    backend: http
  - name: 7
    port: 80
    backend: ftp
    root: /srv
log_level: loud
"#;

#[test]
fn test_invalid_config_reports_every_problem() {
    init_tracing();
    let raw: Value = serde_yaml::from_str(INVALID).unwrap();
    let err = config_spec()
        .check_value(&raw)
        .unwrap_err()
        .into_invalid()
        .unwrap();

    let issues: Vec<String> = err.issues().iter().map(Issue::to_string).collect();
    assert_eq!(
        issues,
        vec![
            "servers[0].port: Does not meet value constraint: Must be in port number range 1-65535",
            "servers[0].backend.url: Missing required mapping key \"url\"",
            "servers[1].name: Must be str",
            "servers[1].backend: Must be one of: \"http\", \"static\"",
            "servers[1]: Keys \"root\" are unhandled; valid keys: \"name\", \"port\", \"backend\", \"headers\"",
            "log_level: Must match enum=null/\"debug\"/\"info\"/\"warn\"",
        ]
    );
}

#[test]
fn test_shared_spec_across_threads() {
    init_tracing();
    let spec = config_spec();
    let raw: Value = serde_yaml::from_str(VALID).unwrap();
    let expected = spec.check_value(&raw).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| spec.check_value(&raw)))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), expected);
        }
    });
}
