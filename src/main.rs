//! Synheart EEG Agent CLI
//!
//! Simulated EEG stream with mental-state estimates and recommendations.

use clap::{Parser, Subcommand};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use synheart_eeg_agent::{
    config::Config,
    core::{
        aggregate, ratios, DataPacket, MentalStateClassifier, PacketBuilder, RecommendationEngine,
        WindowSamples,
    },
    session::{ExportFormat, JsonFileStore, SessionSummary},
    simulator::{Mode, SampleGenerator},
    stream::{ChannelSink, PacketSink, StreamLoop},
    telemetry::PipelineTelemetry,
    SIMULATION_NOTICE, VERSION,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synheart-eeg")]
#[command(author = "Synheart")]
#[command(version = VERSION)]
#[command(about = "Simulated EEG stream to mental-state estimates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream simulated EEG and print each analysed window
    Run {
        /// Simulated mode (relaxed, focused, stressed, sleepy)
        #[arg(long)]
        mode: Option<String>,

        /// Stop after this many seconds (runs until Ctrl+C otherwise)
        #[arg(long)]
        seconds: Option<u64>,

        /// Export the session when the run ends
        #[arg(long)]
        export: bool,

        /// Export format (json or jsonl)
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Analyse a single simulated window and explain the result
    Simulate {
        /// Simulated mode (relaxed, focused, stressed, sleepy)
        #[arg(long, default_value = "relaxed")]
        mode: String,
    },

    /// Run the HTTP control server (requires server feature)
    Serve {
        /// Port to bind to
        #[arg(long, default_value = "8787")]
        port: u16,

        /// Start streaming immediately
        #[arg(long)]
        autostart: bool,
    },

    /// Show cumulative pipeline statistics
    Status,

    /// Show configuration
    Config,
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            mode,
            seconds,
            export,
            format,
        } => {
            cmd_run(mode, seconds, export, &format).await;
        }
        Commands::Simulate { mode } => {
            cmd_simulate(&mode);
        }
        Commands::Serve { port, autostart } => {
            cmd_serve(port, autostart).await;
        }
        Commands::Status => {
            cmd_status();
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("synheart_eeg_agent=info,synheart_eeg=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config, using defaults: {e}");
            Config::default()
        }
    }
}

fn packet_builder(config: &Config) -> PacketBuilder {
    PacketBuilder::new(
        MentalStateClassifier::new(config.classifier.clone()),
        RecommendationEngine::new(config.selector.clone()),
    )
}

fn sample_generator(config: &Config) -> SampleGenerator {
    match config.stream.seed {
        Some(seed) => SampleGenerator::with_seed(config.stream.sampling_rate, seed),
        None => SampleGenerator::new(config.stream.sampling_rate),
    }
}

fn telemetry_path(config: &Config) -> std::path::PathBuf {
    config.storage.data_path.join("telemetry.json")
}

/// Build the stream loop or exit with the configuration error.
fn build_stream<D: PacketSink>(
    config: &Config,
    sink: D,
    telemetry: Arc<PipelineTelemetry>,
) -> StreamLoop<SampleGenerator, D> {
    match StreamLoop::with_telemetry(
        config.stream.clone(),
        packet_builder(config),
        sample_generator(config),
        sink,
        telemetry,
    ) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn print_packet(packet: &DataPacket) {
    let state = &packet.mental_state;
    let top = packet
        .recommendations
        .first()
        .map(|r| r.title.as_str())
        .unwrap_or("-");

    println!(
        "[{}] {:<8} stress {:>3} | focus {:>3} | sleepiness {:>3} | confidence {:.1} | {}",
        packet.timestamp.format("%H:%M:%S"),
        packet.current_mode,
        state.stress_level,
        state.focus_level,
        state.sleepiness_level,
        state.confidence,
        top
    );
}

fn print_summary(summary: &SessionSummary) {
    match summary {
        SessionSummary::Empty => println!("Session: no data collected"),
        SessionSummary::Active {
            count,
            total_duration_seconds,
            averages,
        } => {
            println!("Session: {count} windows, {total_duration_seconds:.1}s of signal");
            println!(
                "  Average stress {:.1} | focus {:.1} | sleepiness {:.1}",
                averages.stress, averages.focus, averages.sleepiness
            );
        }
    }
}

async fn cmd_run(mode: Option<String>, seconds: Option<u64>, export: bool, format: &str) {
    println!("Synheart EEG Agent v{VERSION}");
    println!("{SIMULATION_NOTICE}");

    let Some(export_format) = ExportFormat::parse(format) else {
        eprintln!("Error: Unknown export format {format:?} (expected json or jsonl)");
        std::process::exit(1);
    };

    let config = load_config();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let telemetry = Arc::new(PipelineTelemetry::with_persistence(telemetry_path(&config)));
    let (sink, packets) = ChannelSink::bounded(64);
    let stream = build_stream(&config, sink, telemetry.clone());
    let handle = stream.handle();

    if let Some(mode) = mode {
        if let Err(e) = handle.set_mode(&mode) {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }

    println!("Starting stream...");
    println!("  Mode: {}", handle.mode());
    println!("  Sampling rate: {} Hz", config.stream.sampling_rate);
    println!(
        "  Window: {:.1}s, hop: {:.1}s",
        config.stream.window_duration.as_secs_f64(),
        config.stream.hop_duration.as_secs_f64()
    );
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let task = tokio::spawn(stream.run_until(async move {
        let _ = shutdown_rx.await;
    }));

    handle.start();
    let deadline = seconds.map(|s| Instant::now() + Duration::from_secs(s));

    while running.load(Ordering::SeqCst) {
        while let Ok(packet) = packets.try_recv() {
            print_packet(&packet);
        }

        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    println!();
    println!("Stopping stream...");
    handle.stop();
    let _ = shutdown_tx.send(());
    if let Err(e) = task.await {
        eprintln!("Warning: Stream task ended abnormally: {e}");
    }

    println!();
    print_summary(&handle.session_summary());

    if export {
        let store = JsonFileStore::new(&config.storage.export_path).with_format(export_format);
        match handle.export_session(&store) {
            Ok(receipt) => println!(
                "Exported {} packets to {:?}",
                receipt.count,
                store.dir().join(&receipt.identifier)
            ),
            Err(e) => eprintln!("Error exporting session: {e}"),
        }
    }

    if let Err(e) = telemetry.save() {
        eprintln!("Warning: Could not save telemetry: {e}");
    }

    println!();
    println!("{}", telemetry.summary());
}

fn cmd_simulate(mode: &str) {
    let Some(mode) = Mode::parse(mode) else {
        eprintln!("Error: Unknown mode {mode:?}");
        std::process::exit(1);
    };

    let config = load_config();
    let builder = packet_builder(&config);
    let mut generator = sample_generator(&config);

    let window = WindowSamples::new(
        generator
            .stream(mode, config.stream.window_duration.as_secs_f64())
            .collect(),
    );
    let powers = aggregate(&window);
    let band_ratios = ratios(&powers);
    let indicators = builder.classifier().indicators(&powers);
    let state = builder.classifier().classify(&powers);
    let recommendations = builder.engine().select(&state);

    println!("Simulated window: {} samples in {mode} mode", window.len());
    println!();
    println!("Band powers (mean):");
    println!("  Delta: {:>6.2}", powers.delta_power);
    println!("  Theta: {:>6.2}", powers.theta_power);
    println!("  Alpha: {:>6.2}", powers.alpha_power);
    println!("  Beta:  {:>6.2}", powers.beta_power);
    println!("  Gamma: {:>6.2}", powers.gamma_power);
    println!();
    println!("Ratios:");
    println!("  Beta/Alpha:  {:.2}", band_ratios.beta_alpha_ratio);
    println!("  Theta/Beta:  {:.2}", band_ratios.theta_beta_ratio);
    println!("  Total power: {:.2}", band_ratios.total_power);
    println!();
    println!("Indicators:");
    println!("  Elevated beta:    {}", indicators.elevated_beta);
    println!("  Suppressed alpha: {}", indicators.suppressed_alpha);
    println!("  Low beta:         {}", indicators.low_beta);
    println!("  Elevated delta:   {}", indicators.elevated_delta);
    println!();
    println!("Mental state:");
    println!("  Stress:     {}", state.stress_level);
    println!("  Focus:      {}", state.focus_level);
    println!("  Sleepiness: {}", state.sleepiness_level);
    println!("  Confidence: {:.1}", state.confidence);
    println!();
    println!("Recommendations:");
    for rec in &recommendations {
        let frequency = rec
            .frequency_hz
            .map(|hz| format!(" @ {hz} Hz"))
            .unwrap_or_default();
        println!(
            "  [{}] {}{} ({} min): {}",
            rec.priority, rec.title, frequency, rec.duration_minutes, rec.description
        );
    }
}

#[cfg(feature = "server")]
async fn cmd_serve(port: u16, autostart: bool) {
    use synheart_eeg_agent::server::{run, ServerConfig, ServerState};
    use synheart_eeg_agent::stream::NullSink;

    println!("Synheart EEG Agent v{VERSION}");
    println!("{SIMULATION_NOTICE}");

    let config = load_config();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let telemetry = Arc::new(PipelineTelemetry::with_persistence(telemetry_path(&config)));
    let stream = build_stream(&config, NullSink, telemetry.clone());
    let (handle, task) = stream.spawn();
    if autostart {
        handle.start();
    }

    let store = JsonFileStore::new(&config.storage.export_path);
    let (addr, shutdown_tx) = match run(ServerConfig::new(port), ServerState::new(handle, store)).await
    {
        Ok(bound) => bound,
        Err(e) => {
            eprintln!("Error starting server: {e}");
            std::process::exit(1);
        }
    };

    println!("Listening on http://{addr}");
    println!("Press Ctrl+C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Error waiting for Ctrl+C: {e}");
    }

    let _ = shutdown_tx.send(());
    task.abort();

    if let Err(e) = telemetry.save() {
        eprintln!("Warning: Could not save telemetry: {e}");
    }
    println!();
    println!("{}", telemetry.summary());
}

#[cfg(not(feature = "server"))]
async fn cmd_serve(_port: u16, _autostart: bool) {
    eprintln!("Error: serve requires the server feature (cargo build --features server)");
    std::process::exit(1);
}

fn cmd_status() {
    let config = load_config();

    println!("Synheart EEG Agent Status");
    println!("=========================");
    println!();
    println!("Configuration:");
    println!("  Initial mode: {}", config.stream.initial_mode);
    println!("  Sampling rate: {} Hz", config.stream.sampling_rate);
    println!(
        "  Window: {} samples, hop: {} samples, {} samples per tick",
        config.stream.window_len(),
        config.stream.hop_len(),
        config.stream.samples_per_tick()
    );
    println!("  Sessions directory: {:?}", config.storage.export_path);
    println!();

    let path = telemetry_path(&config);
    if path.exists() {
        let telemetry = PipelineTelemetry::with_persistence(path);
        let stats = telemetry.stats();
        println!("Cumulative Statistics:");
        println!("  Samples generated: {}", stats.samples_generated);
        println!("  Windows analyzed: {}", stats.windows_analyzed);
        println!("  Packets delivered: {}", stats.packets_delivered);
        println!("  Failed ticks: {}", stats.tick_failures);
        println!("  Sessions exported: {}", stats.sessions_exported);
    } else {
        println!("No previous run data found.");
    }
}

fn cmd_config() {
    let config = load_config();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    }) {
        eprintln!("Warning: Could not set Ctrl+C handler: {e}");
    }
}
