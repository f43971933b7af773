//! Workflow configuration.

use std::time::Duration;

/// Workflow configuration.
///
/// Each job kind can be served by its own endpoint, so the three inference
/// steps are configured independently.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Endpoint of the model generation server.
    pub model_endpoint: String,
    /// Endpoint of the masking server.
    pub mask_endpoint: String,
    /// Endpoint of the try-on server.
    pub tryon_endpoint: String,
    /// Attempts per workflow step, including the first.
    pub step_attempts: u32,
    /// Delay between step attempts.
    pub step_delay: Duration,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            model_endpoint: "http://localhost:8001".to_string(),
            mask_endpoint: "http://localhost:8002".to_string(),
            tryon_endpoint: "http://localhost:8003".to_string(),
            step_attempts: 3,
            step_delay: Duration::from_secs(10),
        }
    }
}

impl FlowConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            model_endpoint: std::env::var("FLOW_MODEL_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:8001".to_string()),
            mask_endpoint: std::env::var("FLOW_MASK_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:8002".to_string()),
            tryon_endpoint: std::env::var("FLOW_TRYON_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:8003".to_string()),
            step_attempts: std::env::var("FLOW_STEP_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            step_delay: Duration::from_secs(
                std::env::var("FLOW_STEP_DELAY_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        }
    }
}
