use anyhow::{Context, Result};
use clap::Parser;
use fingerplay::camera::{create_driver, CameraManager, CameraManagerBuilder};
use fingerplay::config::{ensure_config_file, ConfigFileStatus, DisplayOutput};
use fingerplay::display::create_display;
use fingerplay::hands::{initialize_detector, HandDetector, SubprocessDetector};
use fingerplay::keyboard_input::{CommandSource, KeyboardInput, ScriptedCommands};
use fingerplay::piano::AudioSink;
use fingerplay::{FingerplayConfig, SessionOrchestrator};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "fingerplay")]
#[command(about = "Hand-tracking finger piano and coin game driven by a live camera")]
#[command(version)]
#[command(long_about = "Tracks hands in a live camera feed, counts raised fingers, plays a \
note whenever a finger curls (piano mode) and runs a coin collection game where hands pick up \
coins and must dodge a bouncing ball. Cameras are discovered across several capture backends \
and can be switched at runtime with the keyboard.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "fingerplay.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting a session")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// List cameras that deliver frames and exit
    #[arg(long, help = "Enumerate cameras across all capture backends and exit")]
    list_cameras: bool,

    /// Enable the finger piano regardless of the config file
    #[arg(long, help = "Play a note whenever a finger curls")]
    piano: bool,

    /// Enable the coin game regardless of the config file
    #[arg(long, help = "Run the coin collection game")]
    coins: bool,

    /// Run without writing frames to the framebuffer
    #[arg(long, help = "Process frames without display output")]
    headless: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle special modes that don't require full initialization
    if args.print_config {
        println!("# Fingerplay Configuration File");
        println!("# This is the default configuration with all available options");
        println!();
        println!("{}", FingerplayConfig::default_toml()?);
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting fingerplay v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    match ensure_config_file(&args.config) {
        Ok(ConfigFileStatus::Unchanged) => debug!("Configuration file is up to date"),
        Ok(status) => info!("Configuration file {:?}: {}", status, args.config),
        Err(e) => warn!("Could not maintain configuration file {}: {}", args.config, e),
    }

    let mut config = match FingerplayConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    apply_overrides(&mut config, &args);

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let driver = create_driver(config.camera.driver).context("Failed to create capture driver")?;
    let camera = CameraManagerBuilder::new()
        .config(config.camera.clone())
        .driver(driver)
        .resolution(config.display.window_width, config.display.window_height)
        .build()?;

    if args.list_cameras {
        let code = list_cameras(camera);
        std::process::exit(code);
    }

    let detector = initialize_detector(&config.inference, |inference| {
        SubprocessDetector::spawn(inference).map(|d| Box::new(d) as Box<dyn HandDetector>)
    })
    .context("Failed to start hand detector")?;

    let display = create_display(&config.display);
    let mut session = SessionOrchestrator::builder(config)
        .camera(camera)
        .detector(detector)
        .display(display)
        .audio_sink(create_audio_sink())
        .commands(create_command_source())
        .build()
        .map_err(|e| {
            error!("Failed to create session: {}", e);
            e
        })?;

    // The frame loop blocks, so it runs off the async workers while they
    // listen for signals
    let cancel = CancellationToken::new();
    SessionOrchestrator::spawn_signal_handlers(cancel.clone());

    let session_cancel = cancel.clone();
    let exit = tokio::task::spawn_blocking(move || session.run(&session_cancel))
        .await
        .context("Session task failed")?;

    if exit.is_error() {
        error!("Session ended: {}", exit);
    } else {
        info!("Session ended: {}", exit);
    }
    info!("fingerplay exited with code: {}", exit.exit_code());

    std::process::exit(exit.exit_code());
}

fn apply_overrides(config: &mut FingerplayConfig, args: &Args) {
    if args.piano {
        config.games.piano_game = true;
    }
    if args.coins {
        config.games.coins_game = true;
    }
    if args.headless {
        config.display.output = DisplayOutput::Headless;
    }
}

fn list_cameras(mut camera: CameraManager) -> i32 {
    let cameras = camera.enumerate();
    if cameras.is_empty() {
        println!("No cameras found");
        return 1;
    }

    for (position, descriptor) in cameras.iter().enumerate() {
        println!("[{}] {}", position, descriptor);
    }
    0
}

#[cfg(feature = "audio")]
fn create_audio_sink() -> Arc<dyn AudioSink> {
    match fingerplay::piano::CpalAudioSink::new() {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            warn!("Audio output unavailable ({}); notes will be silent", e);
            Arc::new(fingerplay::piano::NullAudioSink)
        }
    }
}

#[cfg(not(feature = "audio"))]
fn create_audio_sink() -> Arc<dyn AudioSink> {
    debug!("Built without audio support; notes will be silent");
    Arc::new(fingerplay::piano::NullAudioSink)
}

fn create_command_source() -> Box<dyn CommandSource> {
    match KeyboardInput::new() {
        Ok(keyboard) => Box::new(keyboard),
        Err(e) => {
            warn!("Keyboard input unavailable ({}); stop with Ctrl+C", e);
            Box::new(ScriptedCommands::new())
        }
    }
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fingerplay={}", log_level)));

    // stderr keeps log lines out of the way of the raw-mode key reader
    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}
