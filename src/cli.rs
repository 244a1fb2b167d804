//! CLI domain: parse, route, output, and presentation only.
//! No pipeline logic; single route table dispatches to the executor.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::{exit_code, map_error};
pub use parse::{Cli, Commands, ConfigCommands, TranslateArgs};
pub use presentation::{format_config_validation, format_run_report_text, format_section_heading};
pub use route::RunContext;
