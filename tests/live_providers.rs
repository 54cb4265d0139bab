#![cfg(feature = "live_providers")]
//! Calls the real Google APIs. Requires GOOGLE_API_KEY and GOOGLE_SEARCH_ENGINE_ID.

use fact_check::config::Config;
use fact_check::lookup::{LookupStatus, create_lookups};

#[tokio::test]
async fn google_lookups_answer_a_known_claim() {
    let config = Config::load().expect("config");
    if config.runtime.google_api_key.is_none() || config.runtime.search_engine_id.is_none() {
        eprintln!("skipping: GOOGLE_API_KEY / GOOGLE_SEARCH_ENGINE_ID not set");
        return;
    }
    let lookups = create_lookups(&config).expect("lookups");

    let claim = "The Great Wall of China is visible from space";
    let registry = lookups.registry.search(claim).await;
    assert_eq!(registry.status, LookupStatus::Ok, "{:?}", registry.message);

    let site = lookups.source.search(claim).await;
    assert_eq!(site.status, LookupStatus::Ok, "{:?}", site.message);
    assert!(site.items.iter().all(|e| !e.url.is_empty()));
}
