//! API DTOs (Data Transfer Objects)

use serde::Serialize;

use crate::application::dispatcher::CommandOutput;

/// Successful command response: `{"success": true, ...command fields}`
#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(flatten)]
    pub output: CommandOutput,
}

impl From<CommandOutput> for CommandResponse {
    fn from(output: CommandOutput) -> Self {
        Self {
            success: true,
            output,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
