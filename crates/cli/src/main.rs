use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use emh_core::{
    blood,
    config::{max_payload_bytes_from_env_value, supported_versions_from_env_value},
    constants::{DEFAULT_LOG_FILTER, MAX_PAYLOAD_BYTES_ENV, SUPPORTED_VERSIONS_ENV},
    normalise::load_profile_file,
    CoreConfig, EmergencyProfile, HealthId, ScanService,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit code for a scanned text that could not be decoded.
const EXIT_DECODE_FAILED: i32 = 2;

#[derive(Parser)]
#[command(name = "emh")]
#[command(about = "Emergency medical QR payload and triage CLI")]
struct Cli {
    /// Maximum QR text size in bytes (overrides EMH_MAX_PAYLOAD_BYTES)
    #[arg(long, global = true)]
    max_bytes: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a patient document (JSON or YAML) into QR payload text
    Encode {
        /// Path to the patient document
        profile: PathBuf,
        /// Issue timestamp (RFC 3339, default: now)
        #[arg(long)]
        issued_at: Option<DateTime<Utc>>,
        /// Generate a health id when the document has none
        #[arg(long)]
        assign_id: bool,
    },
    /// Decode scanned QR text and print the carried profile
    Decode {
        /// Scanned text, or '-' / nothing to read stdin
        text: Option<String>,
    },
    /// Decode scanned QR text and print the full assessment
    Scan {
        /// Scanned text, or '-' / nothing to read stdin
        text: Option<String>,
    },
    /// Classify a patient document
    Classify {
        /// Path to the patient document
        profile: PathBuf,
    },
    /// Show emergency protocols for a patient document
    Protocols {
        /// Path to the patient document
        profile: PathBuf,
    },
    /// Show blood compatibility for a group such as "O-" or "AB positive"
    Blood {
        group: String,
    },
    /// Generate a new health id
    NewId,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(DEFAULT_LOG_FILTER.parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = resolve_config(cli.max_bytes)?;
    let service = ScanService::from_config(&config);

    match cli.command {
        Some(Commands::Encode {
            profile,
            issued_at,
            assign_id,
        }) => {
            let mut profile = read_profile(&profile)?;
            if assign_id && profile.health_id.is_none() {
                let id = HealthId::generate();
                eprintln!("Assigned health id {id}");
                profile.health_id = Some(id);
            }
            let encoded = service
                .encode(&profile, issued_at.unwrap_or_else(Utc::now))
                .context("failed to encode profile")?;
            for field in &encoded.omitted {
                eprintln!("Omitted {} to fit the QR size budget", field.as_str());
            }
            println!("{}", encoded.qr_text);
        }
        Some(Commands::Decode { text }) => {
            let raw = read_input(text.as_deref())?;
            match service.codec().decode(&raw) {
                Ok(decoded) => {
                    println!("{}", serde_json::to_string_pretty(&decoded.profile)?);
                    eprintln!(
                        "Issued at {} (payload version {})",
                        decoded.issued_at.to_rfc3339(),
                        decoded.version
                    );
                }
                Err(e) => {
                    eprintln!("{} [{}: {}]", e.user_message(), e.kind(), e);
                    std::process::exit(EXIT_DECODE_FAILED);
                }
            }
        }
        Some(Commands::Scan { text }) => {
            let raw = read_input(text.as_deref())?;
            match service.scan(&raw, Utc::now()) {
                Ok(outcome) => {
                    let report = serde_json::json!({
                        "record": outcome.record,
                        "profile": outcome.decoded.profile,
                        "assessment": outcome.assessment,
                    });
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                Err(e) => {
                    eprintln!("{} [{}: {}]", e.user_message(), e.kind(), e);
                    std::process::exit(EXIT_DECODE_FAILED);
                }
            }
        }
        Some(Commands::Classify { profile }) => {
            let profile = read_profile(&profile)?;
            let assessment = service.assess(&profile);
            println!("{}", serde_json::to_string_pretty(&assessment.triage)?);
        }
        Some(Commands::Protocols { profile }) => {
            let profile = read_profile(&profile)?;
            let protocols = service.classifier().select_protocols(&profile);
            if protocols.is_empty() {
                println!("No emergency protocols apply.");
            }
            for protocol in protocols {
                println!("{}", protocol.title);
                for (n, step) in protocol.steps.iter().enumerate() {
                    println!("  {}. {}", n + 1, step);
                }
            }
        }
        Some(Commands::Blood { group }) => match blood::resolve_text(&group) {
            Some(info) => println!("{}", serde_json::to_string_pretty(&info)?),
            None => println!("Unknown blood group '{group}'; compatibility not shown."),
        },
        Some(Commands::NewId) => {
            println!("{}", HealthId::generate());
        }
        None => {
            println!("Use 'emh --help' for commands");
        }
    }

    Ok(())
}

fn resolve_config(max_bytes: Option<usize>) -> anyhow::Result<CoreConfig> {
    let max_bytes = match max_bytes {
        Some(bytes) => bytes,
        None => max_payload_bytes_from_env_value(std::env::var(MAX_PAYLOAD_BYTES_ENV).ok())?,
    };
    let versions = supported_versions_from_env_value(std::env::var(SUPPORTED_VERSIONS_ENV).ok())?;
    Ok(CoreConfig::new(max_bytes, versions)?)
}

fn read_profile(path: &Path) -> anyhow::Result<EmergencyProfile> {
    load_profile_file(path).with_context(|| format!("failed to load {}", path.display()))
}

/// Text from the argument, or stdin when the argument is absent or `-`.
fn read_input(arg: Option<&str>) -> anyhow::Result<String> {
    match arg {
        Some(text) if text != "-" => Ok(text.to_string()),
        _ => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}
