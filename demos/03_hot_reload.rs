//! Catalog-driven hot reload.
//!
//! Point the loader at a running catalog service and watch classes come and
//! go without the audio session stopping:
//!
//! ```bash
//! cargo run --example 03_hot_reload -- http://localhost:9000
//! ```

use std::time::Duration;

use ostinato::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let catalog_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:9000".to_string());

    let engine = OstinatoEngine::builder()
        .catalog_url(&catalog_url)
        .build()?;
    let loader = engine.loader().expect("catalog url configured").clone();
    engine.resume()?;

    let events = loader.subscribe();
    match loader.load_all() {
        Ok(entries) => {
            println!("catalog lists {} plugin(s):", entries.len());
            for entry in &entries {
                println!(
                    "  {} ({}) enabled={}",
                    entry.id, entry.filename, entry.enabled
                );
            }
        }
        Err(err) => println!("catalog unavailable: {err}"),
    }

    loader.start_polling(PluginLoader::DEFAULT_POLL_INTERVAL);
    println!("polling {catalog_url} every 10 s; ctrl-c to quit");

    loop {
        match events.recv_timeout(Duration::from_secs(60)) {
            Ok(LoaderEvent::Loaded { id }) => {
                println!("loaded '{id}'; creating a test instance");
                match engine.host().create_plugin(&id, None) {
                    Ok(instance) => {
                        engine.host().connect_plugin(instance.id(), None)?;
                        // Give freshly loaded instruments a hit so they are heard.
                        let _ = engine.host().trigger_plugin(instance.id(), 0.0, 1.0, None);
                    }
                    Err(err) => println!("create failed: {err}"),
                }
            }
            Ok(event) => println!("{event:?}"),
            Err(_) => {}
        }
    }
}
