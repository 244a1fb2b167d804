//! CLI presentation: text rendering of run reports and config validation.

use crate::pipeline::RunReport;
use owo_colors::{OwoColorize, Stream, Style};

/// Format a section heading, bold and underlined when stdout takes colors.
pub fn format_section_heading(title: &str, color: bool) -> String {
    let style = Style::new().bold().underline();
    styled(title, style, color)
}

/// Escapes only when `color` is set and stdout supports them (TTY, `NO_COLOR` unset)
fn styled(text: &str, style: Style, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    text.if_supports_color(Stream::Stdout, |t| t.style(style))
        .to_string()
}

/// Final translation, optionally preceded by the draft and the critique
pub fn format_run_report_text(report: &RunReport, show_steps: bool, color: bool) -> String {
    let ctx = &report.context;
    let final_text = ctx.final_translation().unwrap_or_default();
    if !show_steps {
        return final_text.to_string();
    }

    let mut out = String::new();
    out.push_str(&format!("{}\n", format_section_heading("Draft", color)));
    out.push_str(ctx.translation_1.as_deref().unwrap_or_default());
    out.push_str(&format!("\n\n{}\n", format_section_heading("Critique", color)));
    out.push_str(ctx.reflection.as_deref().unwrap_or_default());
    out.push_str(&format!("\n\n{}\n", format_section_heading("Translation", color)));
    out.push_str(final_text);

    let total_ms: u64 = report.stages.iter().map(|s| s.latency_ms).sum();
    let timings: Vec<String> = report
        .stages
        .iter()
        .map(|s| format!("{} {}ms", s.stage, s.latency_ms))
        .collect();
    let summary = format!("{} ({}ms total)", timings.join(", "), total_ms);
    out.push_str(&format!(
        "\n\n{}",
        styled(&summary, Style::new().dimmed(), color)
    ));
    out
}

pub fn format_config_validation(source: &str, errors: &[String]) -> String {
    if errors.is_empty() {
        return format!("Configuration valid: {}", source);
    }
    let mut s = format!(
        "Configuration invalid: {}\n\nErrors ({}):",
        source,
        errors.len()
    );
    for e in errors {
        s.push_str(&format!("\n  - {}", e));
    }
    s
}
