//! Log drum and clap groove on the default output device.
//!
//! ```bash
//! cargo run --example 01_log_drum
//! ```

use ostinato::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let engine = OstinatoEngine::builder().build()?;
    let host = engine.host();
    host.resume()?;

    host.create_plugin("log-drum", Some("ld-1"))?;
    host.connect_plugin("ld-1", None)?;
    host.set_parameter("ld-1", "decay", 0.5)?;

    host.create_plugin("clap-808", Some("cp-1"))?;
    host.connect_plugin("cp-1", None)?;

    // Two bars of a simple amapiano pattern, scheduled up front against the
    // audio clock.
    let start = engine.context().current_time() + 0.2;
    let bar = 2.0;
    for n in 0..2 {
        let t = start + n as f64 * bar;
        for (offset, velocity, note) in [
            (0.00, 1.0, 48.0),
            (0.75, 0.8, 55.0),
            (1.25, 0.9, 51.0),
            (1.75, 0.7, 48.0),
        ] {
            host.trigger_plugin("ld-1", t + offset, velocity, Some(note))?;
        }
        host.trigger_plugin("cp-1", t + 0.5, 0.9, None)?;
        host.trigger_plugin("cp-1", t + 1.5, 0.9, None)?;
    }

    println!("playing two bars...");
    std::thread::sleep(std::time::Duration::from_secs_f64(0.2 + 2.0 * bar + 1.0));
    Ok(())
}
