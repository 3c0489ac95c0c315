//! Amapiano bass line threaded through the shimmer reverb.
//!
//! ```bash
//! cargo run --example 02_bass_through_reverb
//! ```

use ostinato::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let engine = OstinatoEngine::builder().build()?;
    let host = engine.host();
    host.resume()?;

    let bass = host.create_plugin("amapiano-bass", Some("bass-1"))?;
    host.create_plugin("shimmer-reverb", Some("verb-1"))?;
    host.set_parameter("verb-1", "mix", 0.4)?;
    host.set_parameter("verb-1", "decay", 6.0)?;

    // Effects are wired manually: bass into the reverb, reverb onto the bus.
    // The dry bass reaches the bus through the reverb's mix stage.
    host.process_effect("verb-1", bass.output_node())?;
    host.connect_plugin("verb-1", None)?;

    for (note, hold) in [(36u8, 0.4), (36, 0.4), (39, 0.3), (41, 0.7)] {
        host.note_on("bass-1", note, 1.0, hold)?;
        std::thread::sleep(std::time::Duration::from_secs_f64(hold + 0.1));
    }

    // Let the tail ring out.
    std::thread::sleep(std::time::Duration::from_secs(4));
    Ok(())
}
