use std::io::IsTerminal;

use anstyle::{AnsiColor, Effects, Style};
use pkgsync_core::{CycleResult, InstallOutcome};
use pkgsync_updater::{RetryConfig, UpdateSettings};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

pub(crate) fn current_output_style() -> OutputStyle {
    resolve_output_style(std::io::stdout().is_terminal())
}

pub(crate) fn resolve_output_style(stdout_is_tty: bool) -> OutputStyle {
    if stdout_is_tty {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => format!("[{}] {message}", status.to_ascii_uppercase()),
    }
}

pub(crate) fn render_section_header(style: OutputStyle, title: &str) -> Option<String> {
    match style {
        OutputStyle::Plain => None,
        OutputStyle::Rich => Some(colorize(section_style(), &format!("== {title} =="))),
    }
}

fn section_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightBlue.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

fn outcome_status(outcome: &InstallOutcome) -> &'static str {
    match outcome {
        InstallOutcome::Success => "ok",
        InstallOutcome::ConfirmationPending(_) | InstallOutcome::PromptShown(_) => "wait",
        InstallOutcome::TransientFailure(_) => "retry",
        InstallOutcome::PermanentFailure(_) => "fail",
    }
}

pub(crate) fn format_plan_lines(result: &CycleResult, style: OutputStyle) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(header) = render_section_header(style, "plan") {
        lines.push(header);
    }

    if result.attempts.is_empty() && result.blocked.is_empty() {
        lines.push(render_status_line(style, "ok", "no updates available"));
        return lines;
    }

    for (index, attempt) in result.attempts.iter().enumerate() {
        let message = match &attempt.outcome {
            InstallOutcome::Success => format!(
                "{}. install {} {}",
                index + 1,
                attempt.package,
                attempt.version_code
            ),
            outcome => format!(
                "{}. install {} {}: {outcome}",
                index + 1,
                attempt.package,
                attempt.version_code
            ),
        };
        lines.push(render_status_line(
            style,
            outcome_status(&attempt.outcome),
            &message,
        ));
    }

    for blocked in &result.blocked {
        lines.push(render_status_line(
            style,
            "warn",
            &format!(
                "hold {} {} until {}: {}",
                blocked.package, blocked.version_code, blocked.library, blocked.reason
            ),
        ));
    }

    lines.push(format!(
        "summary: {} install(s), {} held back, retry={}, needs_user_attention={}",
        result.attempts.len(),
        result.blocked.len(),
        result.retry,
        result.needs_user_attention
    ));
    lines
}

pub(crate) fn format_status_lines(
    settings: &UpdateSettings,
    retry: &RetryConfig,
    style: OutputStyle,
) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(header) = render_section_header(style, "status") {
        lines.push(header);
    }

    let never = || "never".to_string();
    lines.push(format!(
        "last-checked: {}",
        settings
            .last_checked_unix
            .map(|value| value.to_string())
            .unwrap_or_else(never)
    ));
    lines.push(format!(
        "catalog-timestamp: {}",
        settings
            .last_catalog_timestamp
            .map(|value| value.to_string())
            .unwrap_or_else(never)
    ));
    lines.push(format!(
        "consecutive-retries: {}",
        settings.consecutive_retries
    ));
    if settings.consecutive_retries > 0 {
        let backoff = retry.backoff_for(settings.consecutive_retries);
        lines.push(render_status_line(
            style,
            "warn",
            &format!("last run asked for a retry after {}s", backoff.as_secs()),
        ));
    }
    lines
}
