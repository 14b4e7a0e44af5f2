//! Application State

use std::sync::Arc;

use payhere_sdk::PayhereClient;

/// Shared application state
#[derive(Clone, Default)]
pub struct AppState {
    /// PayHere client (optional - None if not configured)
    pub payhere: Option<Arc<PayhereClient>>,
}

impl AppState {
    pub fn new(payhere: Option<PayhereClient>) -> Self {
        Self {
            payhere: payhere.map(Arc::new),
        }
    }
}
