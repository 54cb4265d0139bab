pub mod gemini;
pub mod local;
pub mod traits;

pub use gemini::GeminiClient;
pub use local::LocalClient;
pub use traits::{CompletionError, TextCompleter};

use std::sync::Arc;
use tracing::info;

use crate::config::Config;

/// Pick a completion provider from configuration.
///
/// Returns `Ok(None)` when no provider is configured; callers fall back to the
/// deterministic heuristics.
pub fn create_completer(config: &Config) -> anyhow::Result<Option<Arc<dyn TextCompleter>>> {
    let cc = &config.completion;
    match cc.provider.as_str() {
        "none" => Ok(None),
        "gemini" => {
            let Some(key) = config.runtime.gemini_api_key.clone() else {
                anyhow::bail!("completion provider gemini requires GEMINI_API_KEY or GOOGLE_API_KEY");
            };
            info!("Using Gemini completions (model={})", cc.gemini_model);
            Ok(Some(Arc::new(GeminiClient::new(
                key,
                cc.gemini_model.clone(),
                cc.timeout_ms,
            )?)))
        }
        "local" => {
            info!("Using local completions at {}", cc.local_endpoint);
            Ok(Some(Arc::new(LocalClient::new(
                &cc.local_endpoint,
                &cc.local_model,
                cc.timeout_ms,
            )?)))
        }
        _ => {
            // Auto-detect: Gemini when a key is present, otherwise heuristics only
            if let Some(key) = config.runtime.gemini_api_key.clone() {
                info!("Using Gemini completions (model={})", cc.gemini_model);
                return Ok(Some(Arc::new(GeminiClient::new(
                    key,
                    cc.gemini_model.clone(),
                    cc.timeout_ms,
                )?)));
            }
            info!("No completion provider configured; using heuristic extraction only");
            Ok(None)
        }
    }
}
