//! Live statistics stream.

use futures_util::StreamExt;

use truemanager_core::{Manager, RealtimeStats};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(manager: &Manager, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    manager.connect_realtime().await?;
    let mut stats = std::pin::pin!(manager.realtime_stats()?);
    output::notice("Watching live statistics (Ctrl-C to stop)", global.quiet);

    let mut received = 0usize;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            next = stats.next() => {
                let Some(sample) = next else {
                    return Err(CliError::Disconnected);
                };
                output::print_output(&render_sample(&sample, global.output)?, global.quiet);
                received += 1;
                if args.count.is_some_and(|limit| received >= limit) {
                    break;
                }
            }
        }
    }
    Ok(())
}

fn render_sample(sample: &RealtimeStats, format: OutputFormat) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Table | OutputFormat::Plain => summary_line(sample),
        OutputFormat::Yaml => format!("---\n{}", serde_yaml::to_string(sample)?),
        OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(sample)?,
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
fn rate(bytes_per_sec: f64) -> String {
    format!("{}/s", output::bytes(Some(bytes_per_sec.max(0.0) as u64)))
}

fn summary_line(s: &RealtimeStats) -> String {
    let mut parts = vec![format!("cpu {}", output::percent(s.cpu_usage))];

    if s.memory_used.is_some() || s.memory_total.is_some() {
        parts.push(format!(
            "mem {} / {} ({})",
            output::bytes(s.memory_used),
            output::bytes(s.memory_total),
            output::percent(s.memory_percent())
        ));
    }

    for (name, iface) in &s.interfaces {
        parts.push(format!(
            "{name} rx {} tx {}",
            rate(iface.rx_bytes_per_sec),
            rate(iface.tx_bytes_per_sec)
        ));
    }

    parts.join("  ")
}

#[cfg(test)]
mod tests {
    use truemanager_core::InterfaceRate;

    use super::*;

    #[test]
    fn line_lists_cpu_memory_and_interfaces() {
        let mut sample = RealtimeStats {
            cpu_usage: Some(12.5),
            ..RealtimeStats::default()
        };
        assert_eq!(summary_line(&sample), "cpu 12.5%");

        sample.interfaces.insert(
            "eth0".into(),
            InterfaceRate {
                rx_bytes_per_sec: 0.0,
                tx_bytes_per_sec: 0.0,
            },
        );
        assert_eq!(summary_line(&sample), "cpu 12.5%  eth0 rx 0 B/s tx 0 B/s");
    }
}
