use anyhow::Context;
use clap::{Parser, Subcommand};
use empirbus_rs::bridge::{run_listener, Bridge, Command, StateUpdate};
use empirbus_rs::logging::{init_logger_with_level, level_from_verbosity, log_error, log_info};
use empirbus_rs::nxt::SwitchBits;
use empirbus_rs::util::hex::parse_hex_lenient;
use empirbus_rs::{
    decode, ActisenseSerial, BridgeConfig, FrameTransport, ModuleState,
    UnknownInstancePolicy, WriterTransport,
};
use tokio::io::BufReader;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "empirbus-cli")]
#[command(about = "CLI tool for EmpirBus NXT switch and dimmer control")]
struct Cli {
    /// JSON bridge configuration
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Serial port of the Actisense gateway (overrides the configuration)
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode an 8-byte payload and print the delta
    Decode { payload: String },
    /// Print the Actisense line for a full module state
    Encode {
        #[arg(short, long)]
        instance: u8,
        /// Dimmer ratio 0.0-1.0, once per dimmer channel
        #[arg(short, long)]
        dimmer: Vec<f64>,
        /// Switch bits, channel i at bit i (e.g. 0x05)
        #[arg(short, long, default_value = "0x00")]
        switches: String,
    },
    /// Set one channel and transmit the frame
    Set {
        bus: String,
        channel: String,
        state: String,
        /// Start from all-off when the instance state is unknown
        #[arg(long)]
        assume_off: bool,
    },
    /// Read Actisense lines and print a delta per EmpirBus message
    Listen,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger_with_level(level_from_verbosity(cli.verbose));

    let mut config = match &cli.config {
        Some(path) => BridgeConfig::from_json_file(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(port) = cli.port {
        config.serial.port = Some(port);
    }

    match cli.command {
        Commands::Decode { payload } => {
            let bytes = parse_hex_lenient(&payload).context("payload is not hex")?;
            let state = decode(&bytes)?;
            print_update(&StateUpdate::from_state(&state, chrono::Utc::now()))?;
        }
        Commands::Encode {
            instance,
            dimmer,
            switches,
        } => {
            let mut state = ModuleState::new(instance)?;
            for (channel, ratio) in dimmer.into_iter().enumerate() {
                state = state.with_dimmer_ratio(channel, ratio)?;
            }
            state.switches = SwitchBits::from_hex(&switches)?.to_switches();

            let bridge = Bridge::new(config, WriterTransport::new(tokio::io::sink()))?;
            println!("{}", bridge.format_state(&state)?);
        }
        Commands::Set {
            bus,
            channel,
            state,
            assume_off,
        } => {
            if assume_off {
                config.unknown_instance = UnknownInstancePolicy::AssumeOff;
            }
            let command = Command::parse(&bus, &channel, &state)?;
            match config.serial.port.clone() {
                Some(_) => {
                    let (_, transport) = ActisenseSerial::open_configured(&config.serial)?;
                    send(Bridge::new(config, transport)?, &command).await?;
                }
                None => {
                    let transport = WriterTransport::new(tokio::io::stdout());
                    send(Bridge::new(config, transport)?, &command).await?;
                }
            }
        }
        Commands::Listen => {
            let (tx, mut rx) = mpsc::channel::<StateUpdate>(64);
            let printer = tokio::spawn(async move {
                while let Some(update) = rx.recv().await {
                    if let Err(e) = print_update(&update) {
                        log_error(&format!("Cannot print update: {e}"));
                    }
                }
            });

            let stats = match config.serial.port.clone() {
                Some(_) => {
                    let (reader, transport) = ActisenseSerial::open_configured(&config.serial)?;
                    let bridge = Bridge::new(config, transport)?;
                    run_listener(&bridge, reader, tx).await?
                }
                None => {
                    let bridge = Bridge::new(config, WriterTransport::new(tokio::io::sink()))?;
                    run_listener(&bridge, BufReader::new(tokio::io::stdin()), tx).await?
                }
            };
            printer.await?;
            log_info(&format!(
                "{} lines, {} updates, {} ignored, {} dropped, {} unparsable",
                stats.lines, stats.published, stats.ignored, stats.dropped, stats.unparsable
            ));
        }
    }

    Ok(())
}

async fn send<T: FrameTransport>(bridge: Bridge<T>, command: &Command) -> anyhow::Result<()> {
    let line = bridge
        .handle_command(command)
        .await
        .with_context(|| format!("command {} {} rejected", command.instance, command.channel))?;
    log::debug!("Sent {line}");
    Ok(())
}

fn print_update(update: &StateUpdate) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(&update.to_delta()?)?);
    Ok(())
}
