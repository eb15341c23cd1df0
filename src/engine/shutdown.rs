use log::{info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::state::{SessionState, ShutdownReason};
use crate::hal::Transport;
use crate::protocol::{CommandEncoder, CommandRequest};

/// Cooperative cancellation handed to background loops.
/// Cancelled as soon as the session leaves `Running`.
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<SessionState>,
}

impl ShutdownToken {
    pub fn is_cancelled(&self) -> bool {
        !self.rx.borrow().is_running()
    }

    pub async fn cancelled(&mut self) {
        // A dropped coordinator counts as cancellation too.
        let _ = self.rx.wait_for(|state| !state.is_running()).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// This call performed the teardown
    Completed,
    /// Someone else already started it; this call waited for it to finish
    AlreadyInProgress,
}

/// Drives `Running -> Stopping -> Stopped` exactly once.
///
/// Any context may call [`trigger`](Self::trigger) (signal watcher, window
/// timer, inbound-closed watcher); only the first call takes effect. The
/// teardown (STOP, disconnect, join background tasks) runs once no matter
/// how many callers race into [`shutdown`](Self::shutdown).
pub struct ShutdownCoordinator {
    state: watch::Sender<SessionState>,
    torn_down: AtomicBool,
    commands: CommandEncoder,
    transport: Arc<dyn Transport>,
    tasks: Mutex<Vec<(String, JoinHandle<()>)>>,
    teardown_timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn new(
        transport: Arc<dyn Transport>,
        commands: CommandEncoder,
        teardown_timeout: Duration,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Running);
        Self {
            state,
            torn_down: AtomicBool::new(false),
            commands,
            transport,
            tasks: Mutex::new(Vec::new()),
            teardown_timeout,
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn token(&self) -> ShutdownToken {
        ShutdownToken {
            rx: self.state.subscribe(),
        }
    }

    /// Background task joined (or aborted) during teardown
    pub fn register_task(&self, name: impl Into<String>, handle: JoinHandle<()>) {
        self.tasks.lock().push((name.into(), handle));
    }

    /// Enter `Stopping`. Returns false if the session was already stopping
    /// or stopped; nothing else happens in that case.
    pub fn trigger(&self, reason: ShutdownReason) -> bool {
        let mut entered = false;
        self.state.send_if_modified(|state| {
            let target = SessionState::Stopping { reason };
            if state.can_transition_to(&target) {
                *state = target;
                entered = true;
            }
            entered
        });

        if entered {
            info!("Shutdown requested: {}", reason);
        } else {
            info!(
                "Shutdown already {} ({}), ignoring {}",
                self.state().name().to_lowercase(),
                self.state().reason().map(|r| r.to_string()).unwrap_or_default(),
                reason
            );
        }
        entered
    }

    /// Trigger (if needed) and tear down, or wait for the teardown already
    /// running elsewhere.
    pub async fn shutdown(&self, reason: ShutdownReason) -> ShutdownOutcome {
        self.trigger(reason);
        self.teardown().await
    }

    /// Send STOP, release the connection, join background tasks, then
    /// enter `Stopped`. Only the first caller does the work.
    pub async fn teardown(&self) -> ShutdownOutcome {
        if self.state().is_running() {
            // Teardown without a trigger is an operator stop.
            self.trigger(ShutdownReason::Interrupt);
        }

        if self.torn_down.swap(true, Ordering::AcqRel) {
            self.wait_stopped().await;
            return ShutdownOutcome::AlreadyInProgress;
        }

        info!("Sending STOP command...");
        if let Err(e) = self.commands.send(CommandRequest::Stop).await {
            warn!("STOP command not delivered: {}", e);
        }

        if let Err(e) = self.transport.disconnect().await {
            warn!("Disconnect from {} failed: {}", self.transport.transport_id(), e);
        }

        self.join_tasks().await;

        let reason = self.state().reason().unwrap_or(ShutdownReason::Interrupt);
        self.state.send_replace(SessionState::Stopped { reason });
        info!("Disconnected from broker. Session stopped.");
        ShutdownOutcome::Completed
    }

    pub async fn wait_stopped(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx
            .wait_for(|state| matches!(state, SessionState::Stopped { .. }))
            .await;
    }

    async fn join_tasks(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        let deadline = tokio::time::Instant::now() + self.teardown_timeout;

        for (name, mut handle) in tasks {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Task {} ended abnormally: {}", name, e),
                Err(_) => {
                    warn!("Task {} did not stop within {:?}, aborting", name, self.teardown_timeout);
                    handle.abort();
                }
            }
        }
    }
}
