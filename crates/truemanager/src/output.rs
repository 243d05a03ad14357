//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use truemanager_api::types::{AlertLevel, ApiTimestamp, PoolStatus};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

pub fn paint_level(level: AlertLevel, color: bool) -> String {
    let text = level.to_string();
    if !color {
        return text;
    }
    match level {
        AlertLevel::Info | AlertLevel::Notice => text.dimmed().to_string(),
        AlertLevel::Warning => text.yellow().to_string(),
        AlertLevel::Error => text.red().to_string(),
        AlertLevel::Critical | AlertLevel::Alert | AlertLevel::Emergency => {
            text.red().bold().to_string()
        }
    }
}

pub fn paint_pool_status(status: PoolStatus, color: bool) -> String {
    let text = status.to_string();
    if !color {
        return text;
    }
    match status {
        PoolStatus::Online => text.green().to_string(),
        PoolStatus::Degraded => text.yellow().to_string(),
        _ => text.red().bold().to_string(),
    }
}

// ── Value helpers ────────────────────────────────────────────────────

pub fn bytes(value: Option<u64>) -> String {
    value.map_or_else(|| "-".into(), |b| bytesize::ByteSize(b).to_string())
}

pub fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "-".into(), |p| format!("{p:.1}%"))
}

/// Whole-second uptime such as `3days 4h 12m 5s`.
pub fn uptime(seconds: f64) -> String {
    let secs = Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or_default().as_secs();
    humantime::format_duration(Duration::from_secs(secs)).to_string()
}

pub fn timestamp(ts: Option<&ApiTimestamp>) -> String {
    ts.map_or_else(
        || "-".into(),
        |t| t.0.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

pub fn yes_no(flag: bool) -> String {
    (if flag { "yes" } else { "no" }).into()
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
        structured => render_structured(structured, data),
    }
}

/// Render a single item. Table mode uses `detail_fn` for a key/value view.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize + ?Sized,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Plain => Ok(id_fn(data)),
        structured => render_structured(structured, data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Status line for mutations, on stderr so stdout stays parseable.
pub fn notice(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{message}");
    }
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Aligned `key: value` lines for detail views.
pub fn render_pairs(pairs: &[(&str, String)]) -> String {
    let width = pairs.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    pairs
        .iter()
        .map(|(k, v)| format!("{k:<width$}  {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_structured<T: Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        _ => serde_json::to_string_pretty(data)?,
    })
}
