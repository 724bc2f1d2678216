//! services/api/src/adapters/notify.rs
//!
//! A `Notifier` implementation backed by the tracing subscriber. The store
//! layer reports every mutation outcome through this port; in the server it
//! ends up in the structured log stream.

use firesafe_core::ports::Notifier;
use tracing::{error, info};

#[derive(Clone, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        info!(target: "notify", "{}", message);
    }

    fn error(&self, message: &str) {
        error!(target: "notify", "{}", message);
    }
}
