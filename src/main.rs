use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use hyvestream::config::{load_config, SessionConfig, SessionMode};
use hyvestream::engine::{Session, ShutdownCoordinator, ShutdownReason};
use hyvestream::hal::MqttTransport;
use hyvestream::observability::init_logging;
use hyvestream::sinks::{RenderSink, TerminalHeatmap};

/// Stream HYVE sensor-array telemetry over MQTT: heat map, calibration
/// readout, raw monitor or arrival-timing statistics.
#[derive(Parser, Debug)]
#[command(name = "hyvestream", version, long_about = None)]
struct Args {
    /// TOML configuration file (also read from HYVE_CONFIG_PATH)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Session mode
    #[arg(short, long, value_enum)]
    mode: Option<SessionMode>,

    /// Broker host
    #[arg(long)]
    host: Option<String>,

    /// Broker port
    #[arg(long)]
    port: Option<u16>,

    /// MQTT client id
    #[arg(long)]
    client_id: Option<String>,

    /// Collection window in seconds
    #[arg(short, long)]
    window: Option<f64>,

    /// Heat map refresh rate in Hz
    #[arg(long)]
    render_hz: Option<f64>,

    /// Print readings next to the heat map rows
    #[arg(long, default_value_t = false)]
    show_values: bool,

    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Args {
    fn apply(&self, config: &mut SessionConfig) {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(host) = &self.host {
            config.broker.host = host.clone();
        }
        if let Some(port) = self.port {
            config.broker.port = port;
        }
        if let Some(client_id) = &self.client_id {
            config.broker.client_id = client_id.clone();
        }
        if let Some(window) = self.window {
            config.timing.window_secs = Some(window);
        }
        if let Some(rate) = self.render_hz {
            config.render.rate_hz = rate;
        }
        if self.show_values {
            config.render.show_values = true;
        }
    }
}

/// Every Ctrl-C triggers shutdown; only the first one has any effect.
fn spawn_interrupt_watcher(coordinator: Arc<ShutdownCoordinator>) {
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Cannot listen for Ctrl+C: {}", e);
                return;
            }
            info!("Ctrl+C pressed");
            coordinator.trigger(ShutdownReason::Interrupt);
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = load_config(args.config.as_deref()).context("loading configuration")?;
    args.apply(&mut config);
    config.validate()?;

    info!(
        "Mode: {:?}, broker {}:{}, grid {}x{}",
        config.mode, config.broker.host, config.broker.port, config.grid.width, config.grid.height
    );

    let (transport, inbound) = MqttTransport::connect(&config.broker)
        .await
        .context("cannot start without a broker connection")?;

    let sink: Option<Box<dyn RenderSink>> = if config.mode.renders() {
        Some(Box::new(
            TerminalHeatmap::stdout().with_values(config.render.show_values),
        ))
    } else {
        None
    };

    let mut session = Session::prepare(config, Arc::new(transport), Box::new(inbound))?;
    spawn_interrupt_watcher(session.coordinator());
    session.begin(sink).await?;
    info!("Press Ctrl+C to stop and send the STOP command...");

    let report = session.run().await?;
    println!("\n{}", report.generate_report());
    Ok(())
}
