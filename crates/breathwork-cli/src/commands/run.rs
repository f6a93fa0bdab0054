//! Interactive session: engine events go to stdout as JSON lines, commands
//! come from stdin one per line.
//!
//! ```text
//! p            pause
//! r [phase]    resume, optionally at a phase
//! h            start or end a breath hold
//! s            print a state snapshot
//! q            end the session
//! ```

use std::time::Duration;

use breathwork_core::{
    BreathingSessionEngine, Config, Database, Event, FanoutSink, PendingUploads, PersistenceMode,
    Presentation, RemoteSink, SessionDriver, SessionSink, SystemClock,
};
use chrono::Utc;
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;

use super::{api_client, runtime, CmdResult};

const MAX_MINUTES: u64 = 24 * 60;

#[derive(Args)]
pub struct RunArgs {
    /// Pattern name or key, e.g. "Box Breathing" or "4-7-8"
    #[arg(short, long)]
    pattern: Option<String>,
    /// End the session automatically after this many minutes (1-1440)
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..=MAX_MINUTES))]
    minutes: Option<u64>,
}

pub fn run(args: RunArgs) -> CmdResult {
    let config = Config::load_or_default();
    let pattern = match &args.pattern {
        Some(name) => config.find_pattern(name)?,
        None => config.default_pattern()?,
    };
    let rt = runtime()?;
    let result = rt.block_on(async move {
        let (sink, pending) = build_sink(&config)?;
        let presentation = pattern.presentation();
        let engine = BreathingSessionEngine::new(pattern, Box::new(SystemClock::new()), sink)?
            .with_cadences(config.engine);
        let frame = Duration::from_millis(config.engine.frame_ms.max(1));
        let (driver, events) = SessionDriver::spawn(engine, frame);

        drive(&driver, events, &presentation, args.minutes).await?;
        drop(driver);

        if let Some(pending) = pending {
            let report = pending.wait().await;
            tracing::info!(
                uploaded = report.uploaded,
                failed = report.failed,
                "remote uploads settled"
            );
            print_event(
                &Event::UploadsSettled {
                    uploaded: report.uploaded,
                    failed: report.failed,
                    at: Utc::now(),
                },
                &presentation,
            )?;
        }
        Ok::<_, Box<dyn std::error::Error>>(())
    });
    // The stdin reader may still be blocked on a terminal.
    rt.shutdown_background();
    result
}

async fn drive(
    driver: &SessionDriver,
    mut events: tokio::sync::mpsc::UnboundedReceiver<Event>,
    presentation: &Presentation,
    minutes: Option<u64>,
) -> CmdResult {
    let deadline = match minutes {
        Some(m) => Some(session_deadline(m)?),
        None => None,
    };
    driver.dispatch(BreathingSessionEngine::start);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut ending = false;
    let limit = async move {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    };
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(limit, ctrl_c);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                print_event(&event, presentation)?;
                if matches!(event, Event::SessionEnded { .. }) {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => handle_command(driver, line.trim()),
                None => stdin_open = false,
            },
            _ = &mut limit, if !ending => {
                ending = true;
                driver.dispatch(BreathingSessionEngine::end);
            }
            _ = &mut ctrl_c, if !ending => {
                ending = true;
                driver.dispatch(BreathingSessionEngine::end);
            }
        }
    }
    Ok(())
}

fn session_deadline(minutes: u64) -> Result<Instant, String> {
    minutes
        .checked_mul(60)
        .and_then(|secs| Instant::now().checked_add(Duration::from_secs(secs)))
        .ok_or_else(|| format!("--minutes {minutes} is out of range"))
}

fn handle_command(driver: &SessionDriver, line: &str) {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else { return };
    let handled = match cmd {
        "p" | "pause" => driver.dispatch(BreathingSessionEngine::pause),
        "r" | "resume" => {
            let phase = match parts.next().map(str::parse::<usize>) {
                None => None,
                Some(Ok(phase)) => Some(phase),
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "resume ignored: phase is not a number");
                    return;
                }
            };
            driver.dispatch(|e| e.resume(phase))
        }
        "h" | "hold" => driver.dispatch(|e| {
            if e.is_holding() {
                e.end_hold()
            } else {
                e.start_hold()
            }
        }),
        "s" | "status" => driver.dispatch(|e| Some(e.snapshot())),
        "q" | "quit" | "end" => driver.dispatch(BreathingSessionEngine::end),
        other => {
            tracing::warn!(command = other, "unknown command");
            return;
        }
    };
    if handled.is_none() {
        tracing::debug!(command = cmd, "command had no effect");
    }
}

fn print_event(event: &Event, presentation: &Presentation) -> CmdResult {
    let mut value = serde_json::to_value(event)?;
    let phase = match event {
        Event::SessionStarted { .. } => Some(0),
        Event::PhaseAdvanced { phase, .. } | Event::SessionResumed { phase, .. } => Some(*phase),
        Event::HoldEnded { resumed_phase, .. } => Some(*resumed_phase),
        _ => None,
    };
    if let Some(phase) = phase {
        value["label"] = presentation.label(phase).into();
        value["color"] = presentation.color(phase).into();
    }
    println!("{value}");
    Ok(())
}

type Sinks = (Box<dyn SessionSink>, Option<PendingUploads>);

/// Sinks for the configured persistence mode. Must run inside the runtime.
fn build_sink(config: &Config) -> Result<Sinks, Box<dyn std::error::Error>> {
    let handle = tokio::runtime::Handle::current();
    let sinks = match config.persistence.mode {
        PersistenceMode::Local => (Box::new(Database::open()?) as Box<dyn SessionSink>, None),
        PersistenceMode::Remote => {
            let (remote, pending) = RemoteSink::new(api_client(config)?, handle);
            (Box::new(remote) as Box<dyn SessionSink>, Some(pending))
        }
        PersistenceMode::Both => {
            let (remote, pending) = RemoteSink::new(api_client(config)?, handle);
            let fanout = FanoutSink::new(vec![Box::new(Database::open()?), Box::new(remote)]);
            (Box::new(fanout) as Box<dyn SessionSink>, Some(pending))
        }
    };
    Ok(sinks)
}
