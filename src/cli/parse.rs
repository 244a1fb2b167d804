//! CLI parse: clap types for Retrans. No behavior; definitions only.

use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Retrans CLI - Reflective translation: draft, critique, refine
#[derive(Parser, Debug)]
#[command(name = "retrans")]
#[command(about = "Translate text with a draft, an expert critique and a refined rewrite")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (for config/config.toml)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate text through the draft, critique and refine stages
    Translate(TranslateArgs),
    /// Inspect the effective configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args, Debug, Clone)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .args(["text", "file", "request"]),
))]
pub struct TranslateArgs {
    /// Source language (e.g. English)
    #[arg(long, required_unless_present = "request")]
    pub source_lang: Option<String>,

    /// Target language (e.g. Chinese)
    #[arg(long, required_unless_present = "request")]
    pub target_lang: Option<String>,

    /// Country whose colloquial style the translation should match
    #[arg(long, default_value = "")]
    pub country: String,

    /// Text to translate
    #[arg(long)]
    pub text: Option<String>,

    /// Read the text to translate from a file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// JSON request file with source_lang, target_lang, source_text and country
    #[arg(long, conflicts_with_all = ["source_lang", "target_lang"])]
    pub request: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Include the draft and the critique in text output
    #[arg(long)]
    pub show_steps: bool,

    /// Never style text output with ANSI escapes
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML (API key redacted)
    Show,
    /// Validate the effective configuration
    Validate,
}
