//! Ctrl+C handling shared by blocking and async loops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Receives interrupt notifications.
pub struct Interrupt {
    flag: Arc<AtomicBool>,
    rx: UnboundedReceiver<()>,
}

/// Fires an [`Interrupt`].
#[derive(Clone)]
pub struct InterruptHandle {
    flag: Arc<AtomicBool>,
    tx: UnboundedSender<()>,
}

impl Interrupt {
    pub fn new() -> (Self, InterruptHandle) {
        let flag = Arc::new(AtomicBool::new(false));
        let (tx, rx) = unbounded_channel();
        (
            Self {
                flag: Arc::clone(&flag),
                rx,
            },
            InterruptHandle { flag, tx },
        )
    }

    /// Set up the Ctrl+C handler.
    ///
    /// This should be called once at program startup.
    pub fn install() -> Result<Self, ctrlc::Error> {
        let (interrupt, handle) = Self::new();
        ctrlc::set_handler(move || {
            eprintln!("\nReceived Ctrl+C, shutting down...");
            handle.fire();
        })?;
        Ok(interrupt)
    }

    /// Check if Ctrl+C has been received.
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Wait for the next interrupt. Never resolves once every handle is gone.
    pub async fn wait(&mut self) {
        if self.rx.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}

impl InterruptHandle {
    pub fn fire(&self) {
        self.flag.store(true, Ordering::SeqCst);
        let _ = self.tx.send(());
    }
}
