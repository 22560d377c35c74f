//! Shutdown coordination and signal watching.
//!
//! The accept loop and the signal watcher share one [`Shutdown`] handle: the
//! watcher triggers it when SIGINT or SIGTERM arrives, the loop consults it
//! to tell an expected post-shutdown accept failure from a transient one.
//! Triggering is once-only; repeat triggers are ignored.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// Cross-task shutdown coordinator.
///
/// Pairs a once-only flag with a wakeup channel. [`Shutdown::trigger`] stores
/// the flag before it wakes waiters, so a task woken through
/// [`Shutdown::triggered`] always observes [`Shutdown::is_triggered`] as
/// true.
#[derive(Clone)]
pub struct Shutdown {
    inner: Arc<ShutdownInner>,
}

struct ShutdownInner {
    initiated: AtomicBool,
    /// Wakeup channel sender.
    notify_tx: watch::Sender<bool>,
    /// Held so the channel stays open with no waiter around.
    notify_rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (notify_tx, notify_rx) = watch::channel(false);
        Self {
            inner: Arc::new(ShutdownInner {
                initiated: AtomicBool::new(false),
                notify_tx,
                notify_rx,
            }),
        }
    }

    /// Requests shutdown. Only the first call has any effect.
    pub fn trigger(&self) {
        if self.inner.initiated.swap(true, Ordering::SeqCst) {
            return; // Already initiated
        }
        let _ = self.inner.notify_tx.send(true);
    }

    /// Whether shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        self.inner.initiated.load(Ordering::SeqCst)
    }

    /// Waits until shutdown is requested. Resolves immediately if it already
    /// was.
    pub async fn triggered(&self) {
        let mut rx = self.inner.notify_rx.clone();
        let _ = rx.wait_for(|triggered| *triggered).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

fn recognized_signals() -> io::Result<(Signal, Signal)> {
    Ok((
        signal(SignalKind::interrupt())?,
        signal(SignalKind::terminate())?,
    ))
}

async fn await_signal(interrupt: &mut Signal, terminate: &mut Signal) -> &'static str {
    tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
    }
}

/// Registers SIGINT/SIGTERM handlers and blocks until one arrives. Returns
/// the name of the received signal.
pub async fn wait_for_signal() -> io::Result<&'static str> {
    let (mut interrupt, mut terminate) = recognized_signals()?;
    Ok(await_signal(&mut interrupt, &mut terminate).await)
}

/// Spawns the watcher task that converts SIGINT/SIGTERM into a shutdown
/// trigger.
///
/// Handlers are registered here rather than inside the task, so a
/// registration failure aborts startup instead of leaving a daemon running
/// that cannot be stopped.
pub fn spawn_signal_watcher(shutdown: Shutdown) -> io::Result<JoinHandle<()>> {
    let (mut interrupt, mut terminate) = recognized_signals()?;

    Ok(tokio::spawn(async move {
        let name = await_signal(&mut interrupt, &mut terminate).await;
        info!("Received {}, shutting down", name);
        shutdown.trigger();
    }))
}
