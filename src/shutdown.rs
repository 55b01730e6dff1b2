// src/shutdown.rs

//! Shared shutdown signal.
//!
//! One [`Shutdown`] handle is cloned into the producer loop and the feed
//! server at construction time. Either side (or the process owner, on an
//! external termination request) may raise it; both sides observe it in
//! their own loops, so the two activities stop independently but promptly.

use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable handle to the process-wide shutdown flag.
#[derive(Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Raise the signal. Idempotent; wakes every waiter.
    pub fn raise(&self) {
        let _ = self.tx.send(true);
    }

    /// Whether shutdown has been requested.
    pub fn is_raised(&self) -> bool {
        *self.rx.borrow()
    }

    /// Complete once the signal is raised (immediately if it already was).
    pub async fn raised(&self) {
        let mut rx = self.rx.clone();
        let _ = rx.wait_for(|raised| *raised).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
