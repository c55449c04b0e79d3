//! Lists the connected controllers and prints their state as JSON.
//!
//! ```text
//! RUST_LOG=padmap=debug cargo run --example poll -- [config.toml]
//! ```
//!
//! Off Windows (or without the `hid` feature) a virtual pad is used instead.

use padmap::{Config, Context};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mut ctx = context()?.with_config(config);
    let summary = ctx.initialize()?;
    println!(
        "{} device(s) ready, {} unmapped, {} dropped",
        summary.listed, summary.unmapped, summary.dropped
    );

    let handles: Vec<_> = ctx.registry().iter().map(|(h, _)| h).collect();
    for handle in handles {
        if let Some(meta) = ctx.device_meta(handle) {
            println!("{}", serde_json::to_string(&meta)?);
        }
    }

    loop {
        let snap = ctx.snapshot();
        if !snap.is_empty() {
            println!("{}", serde_json::to_string(&snap)?);
        }
        std::thread::sleep(Duration::from_millis(100));
    }
}

#[cfg(all(feature = "hid", target_os = "windows"))]
fn context() -> padmap::Result<Context> {
    Context::system()
}

#[cfg(not(all(feature = "hid", target_os = "windows")))]
fn context() -> padmap::Result<Context> {
    use padmap::backends::virtual_input::VirtualPadBackend;
    use padmap::backends::{pad_buttons, PadFrame};

    let pads = VirtualPadBackend::new();
    pads.set_frame(
        0,
        PadFrame {
            buttons: pad_buttons::A,
            left_stick: [i16::MAX / 2, 0],
            ..PadFrame::default()
        },
    );
    Ok(Context::new().with_pad_backend(pads))
}
