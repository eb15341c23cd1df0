use anyhow::{Context, Result};
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

use super::receiver::run_receive_loop;
use super::{IngestPipeline, RenderLoop, ShutdownCoordinator, ShutdownReason};
use crate::config::SessionConfig;
use crate::hal::{InboundStream, Transport};
use crate::observability::SessionReport;
use crate::protocol::CommandEncoder;
use crate::sinks::RenderSink;

/// One collection run against a connected transport.
///
/// Owns the transport handle, the ingest pipeline and the shutdown
/// coordinator, and wires the background tasks between them.
pub struct Session {
    config: SessionConfig,
    transport: Arc<dyn Transport>,
    pipeline: Arc<IngestPipeline>,
    commands: CommandEncoder,
    coordinator: Arc<ShutdownCoordinator>,
    inbound_closed: Option<oneshot::Receiver<u64>>,
    started_at: Instant,
}

impl Session {
    /// [`prepare`](Self::prepare) followed by [`begin`](Self::begin).
    pub async fn start(
        config: SessionConfig,
        transport: Arc<dyn Transport>,
        inbound: Box<dyn InboundStream>,
        sink: Option<Box<dyn RenderSink>>,
    ) -> Result<Self> {
        let mut session = Self::prepare(config, transport, inbound)?;
        session.begin(sink).await?;
        Ok(session)
    }

    /// Validate the config, build the pipeline and coordinator and start
    /// receiving. Nothing is sent yet, so callers can hook the coordinator
    /// (e.g. to Ctrl-C) before the start command goes out.
    pub fn prepare(
        config: SessionConfig,
        transport: Arc<dyn Transport>,
        inbound: Box<dyn InboundStream>,
    ) -> Result<Self> {
        config.validate()?;

        let pipeline = Arc::new(IngestPipeline::from_config(&config));
        let commands = CommandEncoder::new(transport.clone(), config.topics.command.clone());
        let coordinator = Arc::new(ShutdownCoordinator::new(
            transport.clone(),
            commands.clone(),
            config.teardown_timeout(),
        ));

        let (closed_tx, closed_rx) = oneshot::channel();
        let receive_pipeline = pipeline.clone();
        let receive_handle = tokio::spawn(async move {
            let handled = run_receive_loop(inbound, receive_pipeline).await;
            let _ = closed_tx.send(handled);
        });
        coordinator.register_task("receive", receive_handle);

        Ok(Self {
            config,
            transport,
            pipeline,
            commands,
            coordinator,
            inbound_closed: Some(closed_rx),
            started_at: Instant::now(),
        })
    }

    /// Subscribe, send the mode's start command and, if a sink is given,
    /// start the render loop.
    ///
    /// A subscribe or start-command failure is fatal: the session is torn
    /// down (STOP is still attempted) and the error returned. If shutdown
    /// was already triggered, the start command is skipped.
    pub async fn begin(&mut self, sink: Option<Box<dyn RenderSink>>) -> Result<()> {
        if let Err(e) = self.subscribe_and_start(sink).await {
            error!("Session start failed: {:#}", e);
            self.coordinator.shutdown(ShutdownReason::TransportClosed).await;
            return Err(e);
        }
        Ok(())
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Arc<IngestPipeline> {
        &self.pipeline
    }

    pub fn coordinator(&self) -> Arc<ShutdownCoordinator> {
        self.coordinator.clone()
    }

    /// Time since the start command went out
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Block until something ends the session: a trigger on the coordinator
    /// (e.g. Ctrl-C), the collection window, or the inbound stream closing.
    pub async fn wait(&mut self) -> ShutdownReason {
        let mut token = self.coordinator.token();
        let coordinator = self.coordinator.clone();

        let deadline = self
            .config
            .collection_window()
            .map(|window| self.started_at + window);
        let window = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        let closed_rx = self.inbound_closed.take();
        let closed = async move {
            match closed_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = token.cancelled() => {}
            _ = window => {
                coordinator.trigger(ShutdownReason::WindowElapsed);
            }
            _ = closed => {
                coordinator.trigger(ShutdownReason::TransportClosed);
            }
        }

        coordinator
            .state()
            .reason()
            .unwrap_or(ShutdownReason::Interrupt)
    }

    /// Wait for the end of the session, tear down, and build the report.
    pub async fn run(mut self) -> Result<SessionReport> {
        let reason = self.wait().await;
        self.coordinator.teardown().await;
        Ok(self.report(reason))
    }

    /// Throughput uses the configured window when it ran out, otherwise
    /// the time actually spent collecting.
    fn report(&self, reason: ShutdownReason) -> SessionReport {
        let window = match (reason, self.config.collection_window()) {
            (ShutdownReason::WindowElapsed, Some(window)) => window,
            _ => self.elapsed(),
        };
        let metrics = self.pipeline.timing().finalize(window);
        SessionReport::new(metrics, self.pipeline.metrics().snapshot())
    }
}
