//! Ping command handler.

use std::time::{Duration, Instant};

use serde::Serialize;

use truemanager_core::Manager;

use crate::cli::{GlobalOpts, PingArgs};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct PingResult {
    server: String,
    transport: &'static str,
    reply: String,
    rtt_ms: f64,
}

pub async fn handle(manager: &Manager, args: PingArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (transport, reply, rtt) = if args.websocket {
        manager.connect_realtime().await?;
        let rtt = manager.ddp().ping().await?;
        ("websocket", "pong".to_owned(), rtt)
    } else {
        let started = Instant::now();
        let reply = manager.rest().ping().await?;
        ("rest", reply, started.elapsed())
    };

    let result = PingResult {
        server: manager.config().url.to_string(),
        transport,
        reply,
        rtt_ms: millis(rtt),
    };
    let out = output::render_single(
        global.output,
        &result,
        |r| format!("{} from {} via {} in {:.1} ms", r.reply, r.server, r.transport, r.rtt_ms),
        |r| format!("{:.1}", r.rtt_ms),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
