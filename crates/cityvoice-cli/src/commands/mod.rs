//! Command implementations.

pub mod cluster;
pub mod config;
pub mod import;
pub mod insights;
pub mod items;
pub mod relate;

pub use self::cluster::execute_cluster;
pub use self::config::execute_config;
pub use self::import::execute_import;
pub use self::insights::execute_insights;
pub use self::items::execute_items;
pub use self::relate::execute_relate;

use crate::error::Result;
use cityvoice_cluster::ClusterError;
use cityvoice_domain::traits::LlmProvider;
use cityvoice_llm::{anthropic, AnyProvider, LlmError, ProviderSettings};
use tracing::{info, warn};

/// Build the configured completion provider.
///
/// A missing credential is an error when `required`; otherwise it is logged
/// and `None` is returned so the caller can use its fallbacks.
pub fn connect_llm(settings: &ProviderSettings, required: bool) -> Result<Option<AnyProvider>> {
    let api_key = std::env::var(anthropic::API_KEY_ENV).ok();
    match AnyProvider::from_settings(settings, api_key) {
        Ok(provider) => {
            info!("Using {} ({})", settings.backend, provider.model_name());
            Ok(Some(provider))
        }
        Err(LlmError::MissingCredential(var)) if !required => {
            warn!("{} not set; using rule-based analysis", var);
            Ok(None)
        }
        Err(LlmError::MissingCredential(var)) => {
            Err(ClusterError::MissingCredential(format!("{} is not set", var)).into())
        }
        Err(e) => Err(e.into()),
    }
}
