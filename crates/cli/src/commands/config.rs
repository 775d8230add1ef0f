use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::commands::CommandResult;
use storeagent_core::config::{AppConfig, LoadOptions};
use toml::Value;

struct Field<'a> {
    key: &'a str,
    value: String,
    env_keys: &'a [&'a str],
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            );
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    CommandResult::success("config", lines.join("\n"))
}

fn fields(config: &AppConfig) -> Vec<Field<'static>> {
    let args =
        if config.tools.args.is_empty() { "[]".to_string() } else { config.tools.args.join(" ") };

    vec![
        Field {
            key: "database.url",
            value: config.database.url.clone(),
            env_keys: &["STOREAGENT_DATABASE_URL"],
        },
        Field {
            key: "database.max_connections",
            value: config.database.max_connections.to_string(),
            env_keys: &["STOREAGENT_DATABASE_MAX_CONNECTIONS"],
        },
        Field {
            key: "database.timeout_secs",
            value: config.database.timeout_secs.to_string(),
            env_keys: &["STOREAGENT_DATABASE_TIMEOUT_SECS"],
        },
        Field {
            key: "tools.command",
            value: config.tools.command.clone(),
            env_keys: &["STOREAGENT_TOOLS_COMMAND"],
        },
        Field { key: "tools.args", value: args, env_keys: &[] },
        Field {
            key: "tools.working_dir",
            value: config.tools.working_dir.display().to_string(),
            env_keys: &["STOREAGENT_TOOLS_WORKING_DIR"],
        },
        Field {
            key: "tools.call_timeout_secs",
            value: config.tools.call_timeout_secs.to_string(),
            env_keys: &["STOREAGENT_TOOLS_CALL_TIMEOUT_SECS"],
        },
        Field {
            key: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["STOREAGENT_SERVER_BIND_ADDRESS"],
        },
        Field {
            key: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["STOREAGENT_SERVER_PORT"],
        },
        Field {
            key: "server.graceful_shutdown_secs",
            value: config.server.graceful_shutdown_secs.to_string(),
            env_keys: &["STOREAGENT_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        },
        Field {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["STOREAGENT_LOGGING_LEVEL", "STOREAGENT_LOG_LEVEL"],
        },
        Field {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["STOREAGENT_LOGGING_FORMAT", "STOREAGENT_LOG_FORMAT"],
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("storeagent.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/storeagent.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::{contains_path, field_source, render_line};

    #[test]
    fn nested_keys_are_found_in_file_document() {
        let doc: Value = "[tools]\ncommand = \"storeagent-mcp\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "tools.command"));
        assert!(!contains_path(&doc, "tools.args"));
        assert!(!contains_path(&doc, "server.port"));
    }

    #[test]
    fn file_source_names_the_file() {
        let doc: Value = "[server]\nport = 9000\n".parse().expect("toml");
        let source = field_source(
            "server.port",
            &[],
            Some(&doc),
            Some(std::path::Path::new("storeagent.toml")),
        );

        assert_eq!(source, "file (storeagent.toml)");
        assert_eq!(field_source("server.port", &[], None, None), "default");
    }

    #[test]
    fn rendered_line_includes_source() {
        assert_eq!(
            render_line("server.port", "8000", "default".to_string()),
            "- server.port = 8000 (source: default)"
        );
    }
}
