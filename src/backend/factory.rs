//! Backend factory for creating backend instances from configuration.

use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use std::time::Duration;

use super::{http::HttpBackend, Backend};
use crate::config::ApiConfig;

/// Create a backend instance from backend type and API configuration.
///
/// # Arguments
/// * `backend_type` - The type of backend (currently only "http")
/// * `api` - API section of the configuration
///
/// # Errors
/// Returns error if:
/// - Backend type is unknown
/// - The API token environment variable is not set
/// - The HTTP client cannot be built
pub fn create_backend(backend_type: &str, api: &ApiConfig) -> Result<Arc<dyn Backend>> {
    match backend_type {
        "http" => {
            let api_token = std::env::var(&api.api_token_env)
                .with_context(|| format!("API token not found in environment variable '{}'", api.api_token_env))?;
            let backend = HttpBackend::new(
                api.base_url.clone(),
                api_token,
                Duration::from_secs(api.timeout_seconds),
            )?;
            Ok(Arc::new(backend))
        }
        _ => Err(anyhow!("Unknown backend type: {}", backend_type)),
    }
}
