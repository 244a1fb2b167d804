//! Configuration loading through the CLI run context

use crate::integration::test_utils::env_lock;
use retrans::cli::{Commands, ConfigCommands, RunContext};
use retrans::config::{ConfigLoader, ProviderType};
use retrans::error::ApiError;
use retrans::pipeline::Stage;
use tempfile::TempDir;

fn write_workspace_config(root: &std::path::Path, name: &str, contents: &str) {
    let dir = root.join("config");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn test_environment_file_layers_over_workspace_config() {
    let _guard = env_lock();
    let temp = TempDir::new().unwrap();
    write_workspace_config(
        temp.path(),
        "config.toml",
        r#"
[provider]
provider_type = "ollama"
model = "qwen2.5"

[pipeline.refine]
temperature = 0.2
"#,
    );
    write_workspace_config(
        temp.path(),
        "staging.toml",
        r#"
[pipeline]
request_timeout_secs = 45
"#,
    );

    let original_env = std::env::var("RETRANS_ENV").ok();
    let original_xdg = std::env::var("XDG_CONFIG_HOME").ok();
    std::env::set_var("RETRANS_ENV", "staging");
    std::env::set_var("XDG_CONFIG_HOME", temp.path().join("xdg"));

    let config = ConfigLoader::load(temp.path());

    match original_env {
        Some(v) => std::env::set_var("RETRANS_ENV", v),
        None => std::env::remove_var("RETRANS_ENV"),
    }
    match original_xdg {
        Some(v) => std::env::set_var("XDG_CONFIG_HOME", v),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }

    let config = config.unwrap();
    assert_eq!(config.provider.provider_type, ProviderType::Ollama);
    assert_eq!(config.provider.model, "qwen2.5");
    assert_eq!(config.pipeline.request_timeout_secs, 45);
    let settings = config.pipeline.settings();
    assert_eq!(settings.for_stage(Stage::Refine).temperature, 0.2);
    assert_eq!(settings.for_stage(Stage::Draft).temperature, 0.3);
}

#[test]
fn test_explicit_config_file_for_run_context() {
    let _guard = env_lock();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("retrans.toml");
    std::fs::write(
        &path,
        r#"
[provider]
provider_type = "openai"
model = "deepseek-chat"
endpoint = "https://api.deepseek.com"
api_key = "sk-do-not-print"
"#,
    )
    .unwrap();

    let ctx = RunContext::new(temp.path().to_path_buf(), Some(path)).unwrap();
    assert_eq!(ctx.config().provider.model, "deepseek-chat");

    let shown = ctx
        .execute(&Commands::Config {
            command: ConfigCommands::Show,
        })
        .unwrap();
    assert!(shown.contains("deepseek-chat"));
    assert!(!shown.contains("sk-do-not-print"));

    let validated = ctx
        .execute(&Commands::Config {
            command: ConfigCommands::Validate,
        })
        .unwrap();
    assert!(validated.starts_with("Configuration valid"));
}

#[test]
fn test_missing_explicit_config_file_fails() {
    let _guard = env_lock();
    let temp = TempDir::new().unwrap();
    let result = RunContext::new(
        temp.path().to_path_buf(),
        Some(temp.path().join("absent.toml")),
    );
    assert!(result.is_err());
}

#[test]
fn test_invalid_config_file_type_is_config_error() {
    let _guard = env_lock();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("retrans.toml");
    std::fs::write(&path, "[pipeline]\nrequest_timeout_secs = \"soon\"\n").unwrap();

    assert!(ConfigLoader::load_from_file(&path).is_err());
    let err = RunContext::new(temp.path().to_path_buf(), Some(path))
        .err()
        .unwrap();
    assert!(matches!(err, ApiError::ConfigError(_)));
}
