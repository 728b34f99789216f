// src/main.rs - Panel host binary: serial plumbing around the controller
use clap::Parser;
use serial2_tokio::SerialPort;
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::sync::mpsc;

use chiron_panel::config::Config;
use chiron_panel::controller::PanelController;
use chiron_panel::file_navigator::{FileNavigator, FsMediaStore};
use chiron_panel::firmware::sim::SimFirmware;
use chiron_panel::panel::PanelLink;

#[derive(Parser)]
#[command(name = "panel-host", about = "Anycubic Chiron TFT panel controller")]
struct Args {
    /// Configuration file
    #[arg(default_value = "panel.toml")]
    config: String,

    /// Override the panel serial port from the config
    #[arg(long)]
    port: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    tracing::info!("Starting Chiron panel host");

    let mut config = if std::path::Path::new(&args.config).exists() {
        Config::load(&args.config)?
    } else {
        tracing::warn!("config file '{}' not found, using defaults", args.config);
        Config::default()
    };
    if let Some(port) = args.port {
        config.panel.port = port;
    }

    tracing::info!("Panel: {} @ {} baud", config.panel.port, config.panel.baud);
    tracing::info!("Media root: {}", config.media.root);

    let port = Arc::new(SerialPort::open(&config.panel.port, config.panel.baud)?);

    let (link, mut out_rx) = PanelLink::new();
    let (bytes_tx, bytes_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let (event_tx, events_rx) = mpsc::unbounded_channel();

    // Reader task: raw chunks from the panel UART into the controller.
    let read_port = port.clone();
    tokio::spawn(async move {
        let mut buf = [0u8; 256];
        loop {
            match read_port.read(&mut buf).await {
                Ok(0) => {
                    tracing::info!("panel serial closed");
                    break;
                }
                Ok(n) => {
                    if bytes_tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::TimedOut => continue,
                Err(e) => {
                    tracing::error!("panel serial read error: {}", e);
                    break;
                }
            }
        }
    });

    // Writer task: drains the controller's outbound queue onto the UART.
    let write_port = port.clone();
    tokio::spawn(async move {
        while let Some(text) = out_rx.recv().await {
            let mut remaining = text.as_bytes();
            while !remaining.is_empty() {
                match write_port.write(remaining).await {
                    Ok(n) => remaining = &remaining[n..],
                    Err(e) => {
                        tracing::error!("panel serial write error: {}", e);
                        return;
                    }
                }
            }
        }
        tracing::info!("panel writer task terminated");
    });

    // The firmware side of the bridge. The simulator stands in for a live
    // Marlin link so the panel can be exercised on the bench; a real
    // deployment supplies its own FirmwareApi implementation here.
    let firmware = SimFirmware::new().with_events(event_tx);
    let navigator = FileNavigator::new(FsMediaStore::new(&config.media.root));

    let controller = PanelController::new(config, firmware, link, navigator);
    controller.run(bytes_rx, events_rx).await;

    Ok(())
}
