//! CLI route: single route table and run context. Dispatches to the pipeline and presentation.

use crate::cli::parse::{Commands, ConfigCommands, TranslateArgs};
use crate::cli::presentation::{format_config_validation, format_run_report_text};
use crate::config::{ConfigLoader, RetransConfig};
use crate::error::ApiError;
use crate::gateway::{CompletionGateway, ProviderGateway};
use crate::pipeline::{CancellationToken, PipelineExecutor, RunReport, TranslationRequest};
use crate::provider::ProviderFactory;
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Runtime context for CLI execution: workspace, config path, and the loaded configuration.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config_path: Option<PathBuf>,
    config: RetransConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };
        Ok(Self {
            workspace_root,
            config_path,
            config,
        })
    }

    /// Run context over an already loaded configuration
    pub fn with_config(workspace_root: PathBuf, config: RetransConfig) -> Self {
        Self {
            workspace_root,
            config_path: None,
            config,
        }
    }

    pub fn config(&self) -> &RetransConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Translate(args) => {
                self.config.ensure_valid()?;
                let gateway = self.build_gateway()?;
                self.translate(args, gateway)
            }
            Commands::Config { command } => self.handle_config_command(command),
        }
    }

    /// Run one translation through `gateway` and render the result
    pub fn translate(
        &self,
        args: &TranslateArgs,
        gateway: Arc<dyn CompletionGateway>,
    ) -> Result<String, ApiError> {
        let format = OutputFormat::parse(&args.format)?;
        let request = read_request(args)?;
        let executor = PipelineExecutor::new(gateway).with_settings(self.config.pipeline.settings());

        let report = run_with_interrupt(executor, request)?;
        info!(stages = report.stages.len(), "Translation finished");

        match format {
            OutputFormat::Text => Ok(format_run_report_text(
                &report,
                args.show_steps,
                !args.no_color,
            )),
            OutputFormat::Json => serde_json::to_string_pretty(&report)
                .map_err(|e| ApiError::InvalidInput(format!("Failed to serialize report: {}", e))),
        }
    }

    fn build_gateway(&self) -> Result<Arc<dyn CompletionGateway>, ApiError> {
        let provider = self.config.provider.to_model_provider()?;
        let client = ProviderFactory::create_client(&provider)
            .map_err(|e| ApiError::ProviderNotConfigured(e.to_string()))?;
        let gateway = ProviderGateway::new(client)
            .with_timeout(self.config.pipeline.request_timeout())
            .with_max_tokens(self.config.provider.max_tokens);
        info!(
            provider = gateway.provider_name(),
            model = gateway.model_name(),
            "Provider client ready"
        );
        Ok(Arc::new(gateway))
    }

    fn handle_config_command(&self, command: &ConfigCommands) -> Result<String, ApiError> {
        match command {
            ConfigCommands::Show => {
                let body = toml::to_string_pretty(&self.config.redacted()).map_err(|e| {
                    ApiError::ConfigError(format!("Failed to render config: {}", e))
                })?;
                Ok(format!("{}{}", self.config_source_header(), body))
            }
            ConfigCommands::Validate => {
                let source = match &self.config_path {
                    Some(path) => path.display().to_string(),
                    None => self.workspace_root.display().to_string(),
                };
                match self.config.validate() {
                    Ok(()) => Ok(format_config_validation(&source, &[])),
                    Err(errors) => {
                        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                        Err(ApiError::ConfigError(format_config_validation(
                            &source, &messages,
                        )))
                    }
                }
            }
        }
    }
}

impl RunContext {
    /// TOML comment naming the file the shown config was loaded from
    fn config_source_header(&self) -> String {
        match &self.config_path {
            Some(path) => format!("# Config file: {}\n", path.display()),
            None => {
                let global = ConfigLoader::global_config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(unavailable)".to_string());
                format!(
                    "# Global config: {}\n# Workspace: {}\n",
                    global,
                    self.workspace_root.display()
                )
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(format: &str) -> Result<Self, ApiError> {
        match format {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(ApiError::InvalidInput(format!(
                "Invalid format: {} (must be 'text' or 'json')",
                other
            ))),
        }
    }
}

/// Request from `--request`, or from the language flags plus `--text`/`--file`
fn read_request(args: &TranslateArgs) -> Result<TranslationRequest, ApiError> {
    if let Some(path) = &args.request {
        let raw = read_file(path)?;
        return serde_json::from_str(&raw).map_err(|e| {
            ApiError::InvalidInput(format!("Invalid request file {}: {}", path.display(), e))
        });
    }

    let source_text = match (&args.text, &args.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => read_file(path)?,
        (None, None) => {
            return Err(ApiError::InvalidInput(
                "One of --text, --file or --request is required".to_string(),
            ))
        }
    };
    let source_lang = args
        .source_lang
        .clone()
        .ok_or_else(|| ApiError::InvalidInput("--source-lang is required".to_string()))?;
    let target_lang = args
        .target_lang
        .clone()
        .ok_or_else(|| ApiError::InvalidInput("--target-lang is required".to_string()))?;

    Ok(TranslationRequest::new(
        source_lang,
        target_lang,
        source_text,
        args.country.clone(),
    ))
}

fn read_file(path: &Path) -> Result<String, ApiError> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))
        .map_err(|e| ApiError::InvalidInput(format!("{:#}", e)))
}

/// Drive the pipeline on a fresh runtime; Ctrl-C cancels the run.
fn run_with_interrupt(
    executor: PipelineExecutor,
    request: TranslationRequest,
) -> Result<RunReport, ApiError> {
    let token = CancellationToken::new();
    let executor = executor.with_cancellation(token.clone());

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(async move {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling translation");
                token.cancel();
            }
        });
        executor.run_detailed(request).await
    })?;
    Ok(report)
}
