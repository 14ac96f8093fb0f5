use serde::{Deserialize, Serialize};

/// The only thing the provider ever hears back. The boundary's job is to stop the retry storm, not to surface
/// internal outcomes; those live in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

impl WebhookAck {
    pub fn received() -> Self {
        Self { received: true }
    }
}
