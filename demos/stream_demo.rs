//! Demonstration of the Synheart EEG Agent stream.
//!
//! This example shows how to:
//! 1. Build a stream loop over the simulated generator
//! 2. Receive packets through a channel sink
//! 3. Switch modes while streaming
//! 4. Summarize the session
//!
//! Run with: cargo run --example stream_demo

use std::time::Duration;

use synheart_eeg_agent::{
    session::SessionSummary, ChannelSink, PacketBuilder, SampleGenerator, StreamConfig,
    StreamLoop, SIMULATION_NOTICE,
};

#[tokio::main]
async fn main() {
    println!("Synheart EEG Agent - Stream Demo");
    println!("================================");
    println!("{SIMULATION_NOTICE}");

    let config = StreamConfig::default();
    let (sink, packets) = ChannelSink::bounded(16);
    let stream = match StreamLoop::new(
        config.clone(),
        PacketBuilder::default(),
        SampleGenerator::with_seed(config.sampling_rate, 2024),
        sink,
    ) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Error building stream: {e}");
            return;
        }
    };

    let (handle, task) = stream.spawn();
    handle.start();

    // Five seconds in each mode
    for mode in ["relaxed", "focused", "stressed", "sleepy"] {
        if let Err(e) = handle.set_mode(mode) {
            eprintln!("Error: {e}");
            break;
        }
        println!();
        println!("--- {mode} ---");

        let mut elapsed = Duration::ZERO;
        while elapsed < Duration::from_secs(5) {
            while let Ok(packet) = packets.try_recv() {
                let state = &packet.mental_state;
                println!(
                    "[{}] stress {:>3} | focus {:>3} | sleepiness {:>3} | {} recommendation(s)",
                    packet.current_mode,
                    state.stress_level,
                    state.focus_level,
                    state.sleepiness_level,
                    packet.recommendations.len()
                );
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
            elapsed += Duration::from_millis(100);
        }
    }

    handle.stop();
    task.abort();

    println!();
    match handle.session_summary() {
        SessionSummary::Empty => println!("No windows analyzed."),
        SessionSummary::Active {
            count,
            averages,
            ..
        } => println!(
            "{count} windows | avg stress {:.1}, focus {:.1}, sleepiness {:.1}",
            averages.stress, averages.focus, averages.sleepiness
        ),
    }
    println!();
    println!("{}", handle.telemetry().summary());
}
