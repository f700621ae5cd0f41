//! Admiral
//!
//! A small reparenting X11 window manager: title-bar frames, virtual
//! desktops as bitmasks, modifier+drag move and resize, and a greedy
//! fill-the-free-space layout.

mod config;
mod shared;
mod wm;
mod x11_async;

use anyhow::{Context, Result};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::wm::backend::WindowSystem;
use crate::wm::events::{EventPump, EventTable};
use crate::wm::x11::X11Backend;
use crate::wm::WindowManager;
use crate::x11_async::X11Readiness;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "admiral=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        println!("admiral {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    let replace = args.iter().any(|arg| arg == "--replace" || arg == "-r");

    info!("Starting Admiral {}", env!("CARGO_PKG_VERSION"));
    if replace {
        info!("--replace flag detected: will attempt to replace existing WM");
    }

    let config = config::Config::load().context("Failed to load configuration")?;
    let backend = X11Backend::connect(&config, replace).context("Failed to become the window manager")?;
    let readiness = X11Readiness::new(backend.raw_fd())?;

    let mut wm = WindowManager::new(backend, config).context("Failed to initialize window manager")?;
    wm.adopt_existing_windows()?;

    let result = run(&mut wm, &readiness).await;
    if let Err(e) = &result {
        error!("Event loop failed: {:#}", e);
    }
    if let Err(e) = wm.shutdown() {
        warn!("Failed to release clients cleanly: {:#}", e);
    }
    info!("Admiral exited");
    result
}

async fn run(wm: &mut WindowManager<X11Backend>, readiness: &X11Readiness) -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigchld = signal(SignalKind::child())?;

    let table = EventTable::with_defaults();
    let mut pump = EventPump::new();
    info!("Starting main event loop");

    loop {
        while let Some(event) = pump.next(&mut wm.backend)? {
            table.dispatch(wm, &event)?;
            if !wm.is_running() {
                break;
            }
        }
        if !wm.is_running() {
            info!("Quitting on request");
            return Ok(());
        }
        wm.backend.flush()?;

        tokio::select! {
            ready = readiness.wait_readable() => ready?,
            _ = sigchld.recv() => wm.reap_children(),
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully");
                return Ok(());
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully");
                return Ok(());
            }
        }
    }
}
