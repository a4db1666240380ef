use std::time::Duration;

use tokio::{sync::watch, task::JoinHandle};

/// Debounced copy of a text input
///
/// The output only changes once the input has stayed the same for the whole delay. It starts
/// as `None`, meaning the user has not typed anything yet.
pub struct Debouncer {
    output: watch::Receiver<Option<String>>,
    task: JoinHandle<()>,
}

impl Debouncer {
    pub fn spawn(mut input: watch::Receiver<String>, delay: Duration) -> Self {
        let (tx, output) = watch::channel(None);
        let task = tokio::spawn(async move {
            while input.changed().await.is_ok() {
                // Restart the delay on every keystroke
                loop {
                    tokio::select! {
                        changed = input.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                        _ = tokio::time::sleep(delay) => break,
                    }
                }
                let value = input.borrow_and_update().clone();
                tx.send_if_modified(|current| {
                    if current.as_deref() == Some(value.as_str()) {
                        return false;
                    }
                    tracing::debug!(query = %value, "search input settled");
                    *current = Some(value);
                    true
                });
            }
        });
        Self { output, task }
    }

    pub fn current(&self) -> Option<String> {
        self.output.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.output.clone()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
