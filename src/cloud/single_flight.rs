//! At most one request in flight
//!
//! Starting a new request aborts the previous one, so a slow stale response
//! can never overwrite a newer one.

use std::future::Future;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub struct SingleFlight {
    current: Option<JoinHandle<()>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort whatever is running and start `fut`
    pub fn run<F>(&mut self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.abort();
        self.current = Some(tokio::spawn(fut));
    }

    pub fn abort(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.current
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for SingleFlight {
    fn drop(&mut self) {
        self.abort();
    }
}
