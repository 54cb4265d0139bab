pub mod fixed;
pub mod google;
pub mod traits;

pub use fixed::{StaticLookup, UnavailableLookup};
pub use google::{CustomSearchLookup, FactCheckToolsRegistry, ProviderSettings};
pub use traits::{GeneralSearch, LookupResponse, LookupStatus, RegistryLookup, SourceLookup};

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;

/// The lookup capabilities a verifier runs per claim
#[derive(Clone)]
pub struct Lookups {
    pub source: Arc<dyn SourceLookup>,
    pub registry: Arc<dyn RegistryLookup>,
    pub general: Option<Arc<dyn GeneralSearch>>,
}

/// Build providers from configuration. Missing credentials yield `UnavailableLookup` so
/// verdicts record the source as unavailable instead of the run failing.
pub fn create_lookups(config: &Config) -> anyhow::Result<Lookups> {
    let vc = &config.verification;
    let rt = &config.runtime;
    let settings = ProviderSettings::from(vc);

    let (source, general): (Arc<dyn SourceLookup>, Option<Arc<dyn GeneralSearch>>) =
        match (rt.google_api_key.clone(), rt.search_engine_id.clone()) {
            (Some(key), Some(cx)) => {
                info!(
                    "Using Google Custom Search (sites={})",
                    vc.fact_check_sites.join(",")
                );
                let source = CustomSearchLookup::site_search(
                    key.clone(),
                    cx.clone(),
                    vc.fact_check_sites.clone(),
                    settings.clone(),
                )?;
                let general: Option<Arc<dyn GeneralSearch>> = if vc.general_search {
                    Some(Arc::new(CustomSearchLookup::general(key, cx, settings.clone())?))
                } else {
                    None
                };
                let source: Arc<dyn SourceLookup> = Arc::new(source);
                (source, general)
            }
            _ => {
                warn!("GOOGLE_API_KEY or GOOGLE_SEARCH_ENGINE_ID not set; web search unavailable");
                let msg = "web search not configured (GOOGLE_API_KEY, GOOGLE_SEARCH_ENGINE_ID)";
                let general: Option<Arc<dyn GeneralSearch>> = if vc.general_search {
                    Some(Arc::new(UnavailableLookup::new(msg)))
                } else {
                    None
                };
                let source: Arc<dyn SourceLookup> = Arc::new(UnavailableLookup::new(msg));
                (source, general)
            }
        };

    let registry: Arc<dyn RegistryLookup> = match rt.google_api_key.clone() {
        Some(key) => {
            info!("Using Google Fact Check Tools registry");
            Arc::new(FactCheckToolsRegistry::new(
                key,
                vc.registry_language.clone(),
                settings,
            )?)
        }
        None => {
            warn!("GOOGLE_API_KEY not set; fact-check registry unavailable");
            Arc::new(UnavailableLookup::new(
                "fact-check registry not configured (GOOGLE_API_KEY)",
            ))
        }
    };

    Ok(Lookups {
        source,
        registry,
        general,
    })
}
