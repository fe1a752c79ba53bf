//! Hackerboat host entry point.
//!
//! Runs the control core against the simulated boat.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimBoat           LogEventSink   FileStore     JsonConfigFile │
//! │  (BoatHardware)    (EventSink)    (StoragePort) (ConfigPort)   │
//! │  stdin reader ── CommandSender ──┐                             │
//! │                                  ▼                             │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              BoatService (pure logic)                  │    │
//! │  │  Boat ▸ Nav ▸ RC / Auto · Faults · Commands            │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `hackerboat [config.json] [record-dir] [--armed]`
//!
//! Each stdin line is a command, `{"name": "SetMode", "args": {"mode": "SelfTest"}}`.
#![deny(unused_must_use)]

use std::io::BufRead;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{info, warn};
use serde_json::Value;

use hackerboat::Error;
use hackerboat::adapters::config_file::JsonConfigFile;
use hackerboat::adapters::console_logger;
use hackerboat::adapters::log_sink::LogEventSink;
use hackerboat::adapters::sim::SimBoat;
use hackerboat::adapters::store::FileStore;
use hackerboat::app::commands::CommandSender;
use hackerboat::app::events::BoatEvent;
use hackerboat::app::ports::{ConfigPort, EventSink};
use hackerboat::app::service::BoatService;
use hackerboat::navigation::Location;

const TELEMETRY_INTERVAL: Duration = Duration::from_secs(10);
const DEFAULT_CONFIG: &str = "hackerboat.json";
const DEFAULT_RECORD_DIR: &str = "hackerboat-records";

/// Launch point for the simulated boat.
const SIM_START: Location = Location {
    lat: 47.5907,
    lon: -122.38,
};

/// Forward stdin command lines to the control thread.
fn spawn_command_reader(tx: CommandSender) -> Result<()> {
    thread::Builder::new()
        .name("commands".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Value>(&line) {
                    Ok(v) => match v.get("name").and_then(Value::as_str) {
                        Some(name) => {
                            let args = v.get("args").cloned().unwrap_or(Value::Null);
                            tx.push_cmd(name, args);
                        }
                        None => warn!("Command line has no name: {line}"),
                    },
                    Err(e) => warn!("Unparseable command line: {e}"),
                }
            }
        })
        .context("spawning command reader")?;
    Ok(())
}

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    console_logger::init().context("installing logger")?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Hackerboat v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Arguments ──────────────────────────────────────────
    let mut armed = false;
    let mut positional = Vec::new();
    for arg in std::env::args().skip(1) {
        if arg == "--armed" {
            armed = true;
        } else {
            positional.push(arg);
        }
    }
    let config_path = positional.first().map_or(DEFAULT_CONFIG, String::as_str);
    let record_dir = positional.get(1).map_or(DEFAULT_RECORD_DIR, String::as_str);

    // ── 3. Config and record store ────────────────────────────
    let config = JsonConfigFile::new(config_path)
        .load()
        .map_err(Error::from)
        .with_context(|| format!("loading {config_path}"))?;
    let store = FileStore::new(record_dir).map_err(|_| Error::Init("record store"))?;

    // ── 4. Hardware and service ───────────────────────────────
    let mut boat = SimBoat::new(&config, SIM_START);
    boat.set_armed(armed);
    let frame = config.frame_period();

    let mut sink = LogEventSink::new();
    let mut service = BoatService::new(config, Box::new(store));
    spawn_command_reader(service.command_sender())?;
    service.start(&mut sink);

    info!("System ready. Entering control loop.");

    // ── 5. Control loop ───────────────────────────────────────
    let mut last_telemetry = Instant::now();
    loop {
        let frame_start = Instant::now();

        boat.advance(frame);
        service.tick(&mut boat, &mut sink);

        if last_telemetry.elapsed() >= TELEMETRY_INTERVAL {
            last_telemetry = Instant::now();
            let telemetry = service.build_telemetry(&boat);
            sink.emit(&BoatEvent::Telemetry(telemetry));
        }

        if let Some(rest) = frame.checked_sub(frame_start.elapsed()) {
            thread::sleep(rest);
        } else {
            warn!("Control frame overran by {:?}", frame_start.elapsed() - frame);
        }
    }
}
