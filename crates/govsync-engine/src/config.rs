//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Tunables for a reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of scope passes running at once.
    #[serde(default = "default_max_concurrent_scopes")]
    pub max_concurrent_scopes: usize,

    /// Serialized payloads longer than this many bytes are retained
    /// verbatim on the canonical record.
    #[serde(default = "default_rich_payload_min_bytes")]
    pub rich_payload_min_bytes: usize,
}

fn default_max_concurrent_scopes() -> usize {
    4
}

fn default_rich_payload_min_bytes() -> usize {
    500
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_scopes: default_max_concurrent_scopes(),
            rich_payload_min_bytes: default_rich_payload_min_bytes(),
        }
    }
}
