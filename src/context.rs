use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{DocumentStore, MessagingService};

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub store: Arc<dyn DocumentStore>,
    pub messaging: Arc<dyn MessagingService>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn DocumentStore>,
        messaging: Arc<dyn MessagingService>,
    ) -> Self {
        Self {
            config,
            store,
            messaging,
        }
    }
}
