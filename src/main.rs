use clap::Parser;
use color_eyre::eyre::{self as anyhow, Result, WrapErr};
use std::{future::pending, path::PathBuf, sync::Mutex};
use tokio::sync::watch;
use tracing::{self as log};

use pad_core::PadConfig;

mod codec;
mod input_io;
mod serial_io;
mod session;
mod supervisor;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Option<Commands>,

    /// Serial device of the camera, e.g. `/dev/ttyUSB0` or `COM9`
    #[arg(long)]
    port: Option<String>,

    /// Serial baud rate (overrides the configuration file)
    #[arg(long)]
    baud_rate: Option<u32>,

    /// File or FIFO of newline-delimited JSON control samples. Defaults to
    /// stdin.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Filename of device configuration in YAML format
    #[arg(long)]
    config: Option<String>,

    /// If set, logs are also saved to this directory.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand, Default)]
enum Commands {
    /// Drive the camera from control input (default command)
    #[default]
    Run,
    /// Show the configuration and then quit
    ShowConfig,
    /// Query and log the current pan, tilt and zoom positions
    Position,
    /// Move to a position and quit
    Goto {
        /// Pan position, -32767..=32767
        #[arg(long, allow_hyphen_values = true)]
        pan: Option<i32>,
        /// Tilt position, -32767..=32767
        #[arg(long, allow_hyphen_values = true)]
        tilt: Option<i32>,
        /// Zoom position, 0..=65535 (or a signed delta with `--relative`)
        #[arg(long, allow_hyphen_values = true)]
        zoom: Option<i32>,
        /// Treat the values as offsets from the current position
        #[arg(long)]
        relative: bool,
        /// Pan/tilt speed, 0..=24
        #[arg(long, default_value_t = 12)]
        speed: i32,
    },
}

fn init_logging(log_dir: Option<&std::path::Path>) -> Result<()> {
    use time::{format_description::well_known::Iso8601, UtcOffset};
    use tracing_subscriber::{
        fmt::{self, time::OffsetTime},
        layer::SubscriberExt,
    };

    // Create a fixed offset time formatter based on the timezone at the
    // time this line of code runs.
    let timer = OffsetTime::new(
        UtcOffset::from_whole_seconds(chrono::Local::now().offset().local_minus_utc())?,
        Iso8601::DEFAULT,
    );

    let file_layer = match log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)
                .with_context(|| format!("While creating directory {}", log_dir.display()))?;
            let log_file_name = chrono::Local::now()
                .format(".visca-pad-%Y%m%d_%H%M%S.%f.log")
                .to_string();
            let full_log_file_name = log_dir.join(log_file_name);
            let file = std::fs::File::create(&full_log_file_name).with_context(|| {
                format!("While creating file {}", full_log_file_name.display())
            })?;
            Some(
                fmt::layer()
                    .with_timer(timer.clone())
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true),
            )
        }
        None => None,
    };
    let console_layer = fmt::layer()
        .with_timer(timer)
        .with_file(true)
        .with_line_number(true);
    let collector = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .with(tracing_subscriber::filter::EnvFilter::from_default_env());
    tracing::subscriber::set_global_default(collector)?;
    std::panic::set_hook(Box::new(tracing_panic::panic_hook));
    Ok(())
}

fn load_config(cli: &Cli) -> Result<PadConfig> {
    let mut cfg: PadConfig = if let Some(fname) = &cli.config {
        log::info!("Reading device config from: {fname}");
        let cfg_buf =
            std::fs::read_to_string(fname).with_context(|| format!("opening file {fname}"))?;
        serde_yaml::from_str(&cfg_buf)
            .with_context(|| format!("while parsing YAML in file {fname}"))?
    } else {
        log::info!("Loading default device config.");
        PadConfig::default()
    };
    if let Some(port) = &cli.port {
        cfg.serial.port_path = Some(port.clone());
    }
    if let Some(baud_rate) = cli.baud_rate {
        cfg.serial.baud_rate = baud_rate;
    }
    Ok(cfg)
}

fn port_path(cfg: &PadConfig) -> Result<String> {
    cfg.serial
        .port_path
        .clone()
        .ok_or_else(|| anyhow::eyre!("no serial port given (use --port or serial.port_path)"))
}

async fn show_position(cfg: &PadConfig) -> Result<()> {
    let port = port_path(cfg)?;
    let mut camera = serial_io::open_camera(&port, &cfg.serial)?;
    let (pan, tilt) = camera.pan_tilt().await.context("pan/tilt inquiry")?;
    let zoom = camera.zoom().await.context("zoom inquiry")?;
    log::info!("pan 0x{pan:04X}, tilt 0x{tilt:04X}, zoom 0x{zoom:04X}");
    Ok(())
}

async fn goto(
    cfg: &PadConfig,
    pan: Option<i32>,
    tilt: Option<i32>,
    zoom: Option<i32>,
    relative: bool,
    speed: i32,
) -> Result<()> {
    let port = port_path(cfg)?;
    let mut camera = serial_io::open_camera(&port, &cfg.serial)?;
    let mut ok = true;
    if let Some(pan) = pan {
        ok &= if relative {
            camera.set_pan_rel(pan, speed).await
        } else {
            camera.set_pan(pan, speed).await?
        };
    }
    if let Some(tilt) = tilt {
        ok &= if relative {
            camera.set_tilt_rel(tilt, speed).await
        } else {
            camera.set_tilt(tilt, speed).await?
        };
    }
    if let Some(zoom) = zoom {
        ok &= if relative {
            camera.set_zoom_rel(zoom).await?
        } else {
            camera.set_zoom(zoom).await
        };
    }
    if !ok {
        anyhow::bail!("a command could not be sent");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        let envstr = format!("{}=info,info", env!("CARGO_PKG_NAME")).replace('-', "_");
        std::env::set_var("RUST_LOG", envstr);
    }

    let cli = Cli::parse();
    init_logging(cli.log_dir.as_deref())?;
    log::debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let cfg = load_config(&cli)?;
    let cfg_pretty = serde_yaml::to_string(&cfg)?;
    log::info!("device config:\n{cfg_pretty}");

    // Validate after the config is shown so that errors are printed after it.
    cfg.validate()?;

    match cli.command.unwrap_or_default() {
        Commands::ShowConfig => Ok(()),
        Commands::Position => show_position(&cfg).await,
        Commands::Goto {
            pan,
            tilt,
            zoom,
            relative,
            speed,
        } => goto(&cfg, pan, tilt, zoom, relative, speed).await,
        Commands::Run => {
            let port = port_path(&cfg)?;

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        log::info!("Ctrl-C received, stopping.");
                        shutdown_tx.send_replace(true);
                    }
                    Err(e) => {
                        log::error!("Cannot listen for Ctrl-C: {e}");
                        // keep the sender alive so the session keeps running
                        pending::<()>().await;
                    }
                }
            });

            let reader = input_io::open_input(cli.input.as_deref()).await?;
            let (input_tx, input_rx) = watch::channel(None);
            let input_jh = tokio::spawn(input_io::run_input_loop(reader, input_tx));

            let open = || serial_io::open_camera(&port, &cfg.serial);
            let result = supervisor::supervise(&cfg, open, input_rx, shutdown_rx).await;
            input_jh.abort();
            result
        }
    }
}
