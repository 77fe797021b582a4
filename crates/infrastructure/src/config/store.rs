//! Article store configuration.

use serde::{Deserialize, Serialize};

use super::default_true;

/// Article store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Seed the two demo articles on startup
    #[serde(default = "default_true")]
    pub seed_demo_articles: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            seed_demo_articles: true,
        }
    }
}
