use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AppEvent {
    // Application lifecycle
    Starting,

    // Configuration
    ConfigLoading { path: String },
    ConfigCreated { path: String },
    ConfigMigrated { changes: Vec<String> },
    ConfigLoaded { provider: String },

    // Store
    StoreReady { provider: String, location: String },

    // Operations
    KeyListed { key: String },
    ListCompleted { count: usize },
    Uploaded { key: String, source: String },
    Downloaded { key: String, target: String },
    Deleted { key: String },
    ExistsChecked { key: String, exists: bool },
    UrlGenerated { key: String, url: String, expiry_secs: u64 },

    // Errors
    Error { context: String, error: String },
}

pub struct EventBus {
    pub(super) silent_mode: bool,
}
