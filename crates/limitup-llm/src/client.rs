use std::path::Path;
use std::time::Duration;

use limitup_models::LlmConfig;
use tracing::{info, warn};

use crate::claude::ClaudeProvider;
use crate::error::LlmError;
use crate::gemini::GeminiProvider;
use crate::local::LocalProvider;
use crate::openai::OpenAiProvider;
use crate::provider::{GenerationSettings, LlmProvider};

/// Credentials and endpoint overrides read from the environment.
#[derive(Debug, Clone, Default)]
pub struct ProviderKeys {
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub claude_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    /// Setting this enables the local provider even when a probe would fail.
    pub local_url: Option<String>,
}

impl ProviderKeys {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            openai_api_key: var("OPENAI_API_KEY"),
            openai_base_url: var("OPENAI_BASE_URL"),
            claude_api_key: var("CLAUDE_API_KEY"),
            gemini_api_key: var("GEMINI_API_KEY").or_else(|| var("GOOGLE_API_KEY")),
            local_url: var("LOCAL_LLM_URL"),
        }
    }
}

/// Holds every configured provider and routes requests to the active one.
pub struct LlmClient {
    providers: Vec<Box<dyn LlmProvider>>,
    active: Option<usize>,
}

impl LlmClient {
    /// Providers in priority order; the first becomes active.
    pub fn new(providers: Vec<Box<dyn LlmProvider>>) -> Self {
        let active = if providers.is_empty() { None } else { Some(0) };
        Self { providers, active }
    }

    /// Build every provider that has credentials, in the order
    /// openai, gemini, claude, local. The local provider is added when
    /// `LOCAL_LLM_URL` is set or its server answers a probe.
    pub async fn connect(config: &LlmConfig, keys: ProviderKeys) -> Result<Self, LlmError> {
        let settings = |model: &str, timeout: u64, pdf_timeout: u64| GenerationSettings {
            model: model.to_string(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(timeout),
            pdf_timeout: Duration::from_secs(pdf_timeout),
        };
        let mut providers: Vec<Box<dyn LlmProvider>> = Vec::new();

        if let Some(key) = keys.openai_api_key {
            let base = keys
                .openai_base_url
                .unwrap_or_else(|| config.openai_base_url.clone());
            providers.push(Box::new(OpenAiProvider::new(
                key,
                base,
                settings(
                    &config.openai_model,
                    config.timeout_seconds,
                    config.long_timeout_seconds,
                ),
            )?));
        }
        if let Some(key) = keys.gemini_api_key {
            providers.push(Box::new(GeminiProvider::new(
                key,
                config.gemini_base_url.clone(),
                settings(
                    &config.gemini_model,
                    config.long_timeout_seconds,
                    config.gemini_pdf_timeout_seconds,
                ),
                config.gemini_max_attempts,
            )?));
        }
        if let Some(key) = keys.claude_api_key {
            providers.push(Box::new(ClaudeProvider::new(
                key,
                config.claude_base_url.clone(),
                settings(
                    &config.claude_model,
                    config.timeout_seconds,
                    config.long_timeout_seconds,
                ),
            )?));
        }
        let local_url = match keys.local_url {
            Some(url) => Some(url),
            None if LocalProvider::probe(&config.local_base_url).await => {
                Some(config.local_base_url.clone())
            }
            None => None,
        };
        if let Some(url) = local_url {
            providers.push(Box::new(LocalProvider::new(
                url,
                settings(
                    &config.local_model,
                    config.long_timeout_seconds,
                    config.long_timeout_seconds,
                ),
            )?));
        }

        let mut client = Self::new(providers);
        if let Some(preferred) = &config.preferred_provider {
            if !client.set_active(preferred) {
                warn!(provider = %preferred, "Preferred LLM provider is not configured");
            }
        }
        match client.active_name() {
            Some(name) => info!(provider = name, available = ?client.available(), "LLM provider ready"),
            None => warn!("No LLM provider configured; report analysis will be skipped"),
        }
        Ok(client)
    }

    /// Switch to a configured provider. Returns false if `name` is unknown.
    pub fn set_active(&mut self, name: &str) -> bool {
        match self.providers.iter().position(|p| p.name() == name) {
            Some(index) => {
                self.active = Some(index);
                true
            }
            None => false,
        }
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active_provider().map(|p| p.name())
    }

    pub fn available(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn is_configured(&self) -> bool {
        self.active.is_some()
    }

    fn active_provider(&self) -> Option<&dyn LlmProvider> {
        self.active
            .and_then(|i| self.providers.get(i))
            .map(|p| p.as_ref())
    }

    pub async fn analyze_text(&self, text: &str, prompt: &str) -> Result<String, LlmError> {
        let provider = self.active_provider().ok_or(LlmError::NotConfigured)?;
        provider.analyze_text(text, prompt).await
    }

    pub async fn analyze_pdf(&self, path: &Path, prompt: &str) -> Result<String, LlmError> {
        let provider = self.active_provider().ok_or(LlmError::NotConfigured)?;
        provider.analyze_pdf(path, prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::tests::{MockProvider, Shared};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn client() -> LlmClient {
        LlmClient::new(vec![
            Box::new(MockProvider::new("openai", "from openai")),
            Box::new(MockProvider::new("local", "from local")),
        ])
    }

    #[tokio::test]
    async fn first_provider_is_active() {
        let client = client();
        assert!(client.is_configured());
        assert_eq!(client.active_name(), Some("openai"));
        assert_eq!(client.available(), vec!["openai", "local"]);
        assert_eq!(client.analyze_text("t", "p").await.unwrap(), "from openai");
    }

    #[tokio::test]
    async fn switching_provider() {
        let mut client = client();
        assert!(client.set_active("local"));
        assert_eq!(client.analyze_text("t", "p").await.unwrap(), "from local");
        assert!(!client.set_active("claude"));
        assert_eq!(client.active_name(), Some("local"));
    }

    #[tokio::test]
    async fn active_provider_error_is_returned_without_trying_others() {
        let failing = Arc::new(MockProvider::failing("openai"));
        let backup = Arc::new(MockProvider::new("local", "from local"));
        let mut client = LlmClient::new(vec![
            Box::new(Shared(failing.clone())),
            Box::new(Shared(backup.clone())),
        ]);

        let err = client.analyze_text("t", "p").await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 500, .. }));
        assert_eq!(failing.text_calls.load(Ordering::SeqCst), 1);
        assert_eq!(backup.text_calls.load(Ordering::SeqCst), 0);

        assert!(client.set_active("local"));
        assert_eq!(client.analyze_text("t", "p").await.unwrap(), "from local");
    }

    #[tokio::test]
    async fn empty_client_is_not_configured() {
        let client = LlmClient::new(Vec::new());
        assert!(!client.is_configured());
        assert!(matches!(
            client.analyze_text("t", "p").await,
            Err(LlmError::NotConfigured)
        ));
        assert!(matches!(
            client.analyze_pdf(Path::new("a.pdf"), "p").await,
            Err(LlmError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn connect_orders_by_priority_and_honours_preference() {
        let config = LlmConfig {
            preferred_provider: Some("claude".to_string()),
            local_base_url: "http://127.0.0.1:9".to_string(),
            ..LlmConfig::default()
        };
        let keys = ProviderKeys {
            openai_api_key: Some("sk-test".to_string()),
            claude_api_key: Some("ck-test".to_string()),
            gemini_api_key: Some("gk-test".to_string()),
            ..ProviderKeys::default()
        };
        let client = LlmClient::connect(&config, keys).await.unwrap();
        assert_eq!(client.available(), vec!["openai", "gemini", "claude"]);
        assert_eq!(client.active_name(), Some("claude"));
    }

    #[tokio::test]
    async fn connect_without_keys_or_server() {
        let config = LlmConfig {
            local_base_url: "http://127.0.0.1:9".to_string(),
            ..LlmConfig::default()
        };
        let client = LlmClient::connect(&config, ProviderKeys::default())
            .await
            .unwrap();
        assert!(!client.is_configured());
    }
}
