use serde::{Deserialize, Serialize};

/// Main configuration structure loaded from fact_check.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub extraction: ExtractionConfig,
    pub verification: VerificationConfig,
    pub completion: CompletionConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Claim extraction settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub max_claims: usize,
    pub min_claim_chars: usize,
    /// Ask the completion model to drop opinions from the heuristic candidates
    pub model_filter: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_claims: 5,
            min_claim_chars: 10,
            model_filter: true,
        }
    }
}

/// Lookup orchestration settings for the verifier
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub lookup_timeout_ms: u64,
    pub max_concurrent_claims: usize,
    pub general_search: bool,
    pub fact_check_sites: Vec<String>,
    pub lookup_retries: u32,
    pub snippet_chars: usize,
    pub registry_language: Option<String>,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            lookup_timeout_ms: 8_000,
            max_concurrent_claims: 4,
            general_search: true,
            fact_check_sites: vec![
                "snopes.com".to_string(),
                "factcheck.org".to_string(),
                "politifact.com".to_string(),
            ],
            lookup_retries: 2,
            snippet_chars: 300,
            registry_language: None,
        }
    }
}

/// Text-completion capability used by the model-assisted extractor
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// "auto", "gemini", "local" or "none"
    pub provider: String,
    pub gemini_model: String,
    pub local_endpoint: String,
    pub local_model: String,
    pub timeout_ms: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: "auto".to_string(),
            gemini_model: "gemini-2.0-flash".to_string(),
            local_endpoint: "http://127.0.0.1:8111".to_string(),
            local_model: "NousResearch/Hermes-3-Llama-3.2-3B-GGUF".to_string(),
            timeout_ms: 20_000,
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub google_api_key: Option<String>,
    pub search_engine_id: Option<String>,
    pub gemini_api_key: Option<String>,
    pub log_level: String,
    pub http_bind: std::net::SocketAddr,
    pub http_request_timeout_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            search_engine_id: None,
            gemini_api_key: None,
            log_level: "fact_check=info,tower_http=info".to_string(),
            http_bind: std::net::SocketAddr::from(([127, 0, 0, 1], 8080)),
            http_request_timeout_ms: 60_000,
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses FACT_CHECK_CONFIG environment variable or defaults to "fact_check.toml"
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(env_path) = std::env::var("FACT_CHECK_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::dotenv();
        }

        let config_path = std::env::var("FACT_CHECK_CONFIG")
            .unwrap_or_else(|_| "fact_check.toml".to_string());

        let mut config: Config = if let Ok(content) = std::fs::read_to_string(&config_path) {
            Self::from_toml_str(&content)?
        } else {
            tracing::warn!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides();
        config.runtime = RuntimeConfig::load_from_env();
        config.validate();

        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse::<usize>("FACT_CHECK_MAX_CLAIMS") {
            self.extraction.max_claims = v;
        }
        if let Some(v) = env_parse::<usize>("FACT_CHECK_MIN_CLAIM_CHARS") {
            self.extraction.min_claim_chars = v;
        }
        if let Some(v) = env_flag("FACT_CHECK_MODEL_FILTER") {
            self.extraction.model_filter = v;
        }
        if let Some(v) = env_parse::<u64>("FACT_CHECK_LOOKUP_TIMEOUT_MS") {
            self.verification.lookup_timeout_ms = v;
        }
        if let Some(v) = env_parse::<usize>("FACT_CHECK_MAX_CONCURRENT_CLAIMS") {
            self.verification.max_concurrent_claims = v;
        }
        if let Some(v) = env_flag("FACT_CHECK_GENERAL_SEARCH") {
            self.verification.general_search = v;
        }
        if let Ok(sites) = std::env::var("FACT_CHECK_SITES") {
            let sites: Vec<String> = sites
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !sites.is_empty() {
                self.verification.fact_check_sites = sites;
            }
        }
        if let Some(v) = env_parse::<u32>("FACT_CHECK_LOOKUP_RETRIES") {
            self.verification.lookup_retries = v;
        }
        if let Ok(lang) = std::env::var("FACT_CHECK_REGISTRY_LANGUAGE") {
            self.verification.registry_language = Some(lang).filter(|l| !l.trim().is_empty());
        }
        if let Ok(provider) = std::env::var("FACT_CHECK_COMPLETION_PROVIDER") {
            self.completion.provider = provider;
        }
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            self.completion.gemini_model = model;
        }
        if let Ok(endpoint) = std::env::var("FACT_CHECK_LOCAL_ENDPOINT") {
            self.completion.local_endpoint = endpoint;
        }
        if let Ok(model) = std::env::var("FACT_CHECK_LOCAL_MODEL") {
            self.completion.local_model = model;
        }
        if let Some(v) = env_parse::<u64>("FACT_CHECK_COMPLETION_TIMEOUT_MS") {
            self.completion.timeout_ms = v;
        }
    }

    /// Clamp out-of-range values, warning about each adjustment
    pub fn validate(&mut self) {
        if self.extraction.max_claims == 0 {
            tracing::warn!("max_claims 0 is not usable, falling back to 5");
            self.extraction.max_claims = 5;
        } else if self.extraction.max_claims > 50 {
            tracing::warn!(
                "max_claims {} exceeds max 50, clamping to 50",
                self.extraction.max_claims
            );
            self.extraction.max_claims = 50;
        }

        if self.extraction.min_claim_chars == 0 {
            self.extraction.min_claim_chars = 1;
        }

        if self.verification.lookup_timeout_ms < 100 {
            tracing::warn!(
                "lookup_timeout_ms {} is below 100ms, clamping to 100",
                self.verification.lookup_timeout_ms
            );
            self.verification.lookup_timeout_ms = 100;
        }

        self.verification.max_concurrent_claims =
            self.verification.max_concurrent_claims.clamp(1, 32);

        if self.verification.lookup_retries > 5 {
            tracing::warn!(
                "lookup_retries {} exceeds max 5, clamping to 5",
                self.verification.lookup_retries
            );
            self.verification.lookup_retries = 5;
        }

        if self.verification.snippet_chars < 40 {
            self.verification.snippet_chars = 40;
        }

        match self.completion.provider.as_str() {
            "auto" | "gemini" | "local" | "none" => {}
            other => {
                tracing::warn!("Unknown completion provider '{}', using auto", other);
                self.completion.provider = "auto".to_string();
            }
        }
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        let mut cfg = Self {
            google_api_key: non_placeholder("GOOGLE_API_KEY"),
            search_engine_id: non_placeholder("GOOGLE_SEARCH_ENGINE_ID"),
            gemini_api_key: non_placeholder("GEMINI_API_KEY")
                .or_else(|| non_placeholder("GOOGLE_API_KEY")),
            log_level: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "fact_check=info,tower_http=info".to_string()),
            ..Self::default()
        };

        if let Ok(v) = std::env::var("FACT_CHECK_HTTP_BIND")
            && let Ok(bind) = v.parse::<std::net::SocketAddr>()
        {
            cfg.http_bind = bind;
        }
        if let Some(timeout) = env_parse::<u64>("FACT_CHECK_HTTP_REQUEST_TIMEOUT_MS") {
            cfg.http_request_timeout_ms = timeout;
        }

        cfg
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// Treat empty values and template leftovers as unset
fn non_placeholder(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| {
        let t = v.trim();
        !(t.is_empty()
            || t.contains("${")
            || t.contains("...")
            || t.eq_ignore_ascii_case("your-api-key-here")
            || t.eq_ignore_ascii_case("changeme"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.extraction.max_claims, 5);
        assert_eq!(config.extraction.min_claim_chars, 10);
        assert_eq!(config.verification.lookup_timeout_ms, 8_000);
        assert_eq!(config.verification.fact_check_sites.len(), 3);
        assert!(config.verification.general_search);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [extraction]
            max_claims = 3

            [verification]
            general_search = false
            "#,
        )
        .unwrap();
        assert_eq!(config.extraction.max_claims, 3);
        assert_eq!(config.extraction.min_claim_chars, 10);
        assert!(!config.verification.general_search);
        assert_eq!(config.verification.lookup_retries, 2);
        assert_eq!(config.completion.provider, "auto");
    }

    #[test]
    fn validate_clamps_out_of_range_values() {
        let mut config = Config::default();
        config.extraction.max_claims = 0;
        config.verification.lookup_timeout_ms = 5;
        config.verification.max_concurrent_claims = 0;
        config.verification.lookup_retries = 99;
        config.completion.provider = "mystery".into();
        config.validate();
        assert_eq!(config.extraction.max_claims, 5);
        assert_eq!(config.verification.lookup_timeout_ms, 100);
        assert_eq!(config.verification.max_concurrent_claims, 1);
        assert_eq!(config.verification.lookup_retries, 5);
        assert_eq!(config.completion.provider, "auto");
    }
}
