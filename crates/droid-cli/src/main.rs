//! `droidctl`: encode and decode Droid Depot frames and beacons offline.
//!
//! Useful for checking captures from a BLE sniffer or building payloads for a
//! beacon transmitter without a droid at hand.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use droid_link::LinkConfig;
use droid_protocol::{
    beacon_to_hex, decode_identity_beacon_hex, decode_location_beacon_hex, decode_notification,
    encode_command_hex, encode_identity_beacon, encode_location_beacon, DroidCommandId,
    IdentityBeacon, LocationBeacon, ProtocolError, OFFICIAL_LOCATION_BEACONS,
};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Command Line
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "droidctl", author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode a command frame.
    EncodeCommand {
        /// Command id (decimal).
        #[arg(long)]
        id: u8,
        /// Payload as hex.
        #[arg(long, default_value = "")]
        payload: String,
    },
    /// Decode a notification frame given as hex.
    DecodeNotification {
        /// Raw notification bytes as hex.
        frame: String,
    },
    /// Encode a park location beacon.
    EncodeLocation {
        /// Script to run (1-7).
        #[arg(long)]
        script: u8,
        /// Reaction interval.
        #[arg(long, default_value_t = 2)]
        interval: u8,
        /// Minimum signal strength in dBm.
        #[arg(long, default_value_t = -38, allow_negative_numbers = true)]
        dbm: i8,
        /// Target unpaired droids.
        #[arg(long)]
        unpaired: bool,
    },
    /// Decode a park location beacon given as hex.
    DecodeLocation {
        /// Beacon payload as hex.
        payload: String,
    },
    /// Encode a droid identity beacon.
    EncodeIdentity {
        /// Affiliation id.
        #[arg(long, default_value_t = 1)]
        affiliation: u8,
        /// Personality id.
        #[arg(long, default_value_t = 2)]
        personality: u8,
        /// Advertise as unpaired.
        #[arg(long)]
        unpaired: bool,
    },
    /// Decode a droid identity beacon given as hex.
    DecodeIdentity {
        /// Beacon payload as hex.
        payload: String,
    },
    /// List the official park location beacons.
    Beacons,
    /// Show the effective link configuration.
    Config {
        /// YAML file to load. Defaults are shown when omitted.
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Link(#[from] droid_link::LinkError),

    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("output error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("output error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// ============================================================================
// Output
// ============================================================================

/// Ordered key/value output, printed as `key: value` lines or a JSON object.
#[derive(Debug, Default)]
struct Report {
    fields: Vec<(&'static str, Value)>,
}

impl Report {
    fn field(mut self, key: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((key, value.into()));
        self
    }

    fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Value::Object(map)
    }

    fn print(&self, as_json: bool) -> Result<(), CliError> {
        if as_json {
            println!("{}", serde_json::to_string_pretty(&self.to_json())?);
        } else {
            for (key, value) in &self.fields {
                match value {
                    Value::String(s) => println!("{}: {}", key, s),
                    other => println!("{}: {}", key, other),
                }
            }
        }
        Ok(())
    }
}

fn location_report(beacon: &LocationBeacon) -> Report {
    Report::default()
        .field("script_id", beacon.script_id)
        .field("reaction_interval", beacon.reaction_interval)
        .field("signal_strength_dbm", beacon.signal_strength_dbm)
        .field("droid_paired", beacon.droid_paired)
}

fn identity_report(beacon: &IdentityBeacon) -> Report {
    Report::default()
        .field("data_length", beacon.data_length)
        .field("droid_paired", beacon.droid_paired)
        .field("affiliation_id", beacon.affiliation_id)
        .field("personality_id", beacon.personality_id)
}

// ============================================================================
// Commands
// ============================================================================

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::EncodeCommand { id, payload } => {
            let frame = encode_command_hex(id, &payload)?;
            Report::default()
                .field("command_id", id)
                .field("frame", hex::encode(frame))
                .print(cli.json)
        }

        Commands::DecodeNotification { frame } => {
            let raw = hex::decode(frame.trim())?;
            let message = decode_notification(&raw)?;
            let name = DroidCommandId::try_from(message.command_id)
                .map(|id| format!("{:?}", id))
                .unwrap_or_else(|_| "Unknown".to_string());
            Report::default()
                .field("size", message.declared_size)
                .field("command_id", message.command_id)
                .field("command", name)
                .field("reserved1", message.reserved1)
                .field("reserved2", message.reserved2)
                .field("payload", message.payload_hex())
                .print(cli.json)
        }

        Commands::EncodeLocation {
            script,
            interval,
            dbm,
            unpaired,
        } => {
            let payload = encode_location_beacon(script, interval, dbm, !unpaired)?;
            Report::default()
                .field("payload", beacon_to_hex(&payload))
                .print(cli.json)
        }

        Commands::DecodeLocation { payload } => {
            let beacon = decode_location_beacon_hex(payload.trim())?;
            location_report(&beacon).print(cli.json)
        }

        Commands::EncodeIdentity {
            affiliation,
            personality,
            unpaired,
        } => {
            let payload = encode_identity_beacon(!unpaired, affiliation, personality)?;
            Report::default()
                .field("payload", beacon_to_hex(&payload))
                .print(cli.json)
        }

        Commands::DecodeIdentity { payload } => {
            let beacon = decode_identity_beacon_hex(payload.trim())?;
            identity_report(&beacon).print(cli.json)
        }

        Commands::Beacons => {
            let mut entries = Vec::with_capacity(OFFICIAL_LOCATION_BEACONS.len());
            for beacon in OFFICIAL_LOCATION_BEACONS {
                let decoded = decode_location_beacon_hex(beacon.payload)?;
                if cli.json {
                    let mut entry = location_report(&decoded).to_json();
                    entry["name"] = json!(beacon.name);
                    entry["payload"] = json!(beacon.payload);
                    entries.push(entry);
                } else {
                    println!(
                        "{:<24} {}  script={} interval={} dbm={} paired={}",
                        beacon.name,
                        beacon.payload,
                        decoded.script_id,
                        decoded.reaction_interval,
                        decoded.signal_strength_dbm,
                        decoded.droid_paired
                    );
                }
            }
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            }
            Ok(())
        }

        Commands::Config { file } => {
            let config = match file {
                Some(path) => {
                    debug!(path = %path.display(), "loading link configuration");
                    LinkConfig::load(path)?
                }
                None => LinkConfig::default(),
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", serde_yaml::to_string(&config)?);
            }
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
