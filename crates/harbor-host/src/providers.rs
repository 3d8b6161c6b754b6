//! LLM provider registry: the Host Facade's `detect`/`list`/`setActive`/
//! `setApiKey` surface over `harbor-llm`'s concrete providers (§4.6 LLM
//! ops, §4.4).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use harbor_llm::{ClaudeProvider, LlmProvider, OpenAiCompatProvider, ProviderConfig, ZaiProvider};
use serde::{Deserialize, Serialize};

use crate::error::{HostError, HostResult};

/// One API key per cloud provider, consulted during `detect` (§6:
/// "Provider API keys: one per supported cloud provider, consulted
/// during detection").
const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
const ZAI_API_KEY_ENV: &str = "ZAI_API_KEY";

/// A provider known to the registry, whether or not it is currently
/// configured with credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Provider id (`"claude"`, `"openai"`, `"zai"`, `"lm-studio"`).
    pub id: String,
    /// Whether credentials are present (or, for local providers, whether
    /// the endpoint is configured at all).
    pub configured: bool,
    /// The model this provider is currently set to use, if configured.
    pub model: Option<String>,
}

/// Holds every configured LLM provider plus which one is active.
///
/// Credentials live only in process memory; `harbor-audit` never logs an
/// API key, only the `setApiKey`/`removeApiKey` operation occurring.
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn LlmProvider>>>,
    active: RwLock<Option<String>>,
}

impl ProviderRegistry {
    /// Build an empty registry. Call [`ProviderRegistry::detect`] to
    /// populate it from environment variables.
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            active: RwLock::new(None),
        }
    }

    /// Probe the environment for provider credentials and register every
    /// provider found, plus an always-available local LM Studio entry.
    /// Returns the ids registered. If no provider was previously active,
    /// the first one detected becomes active.
    pub fn detect(&self) -> Vec<String> {
        let mut found = Vec::new();

        if let Ok(key) = std::env::var(ANTHROPIC_API_KEY_ENV) {
            let config = ProviderConfig::new(key, "claude-sonnet-4-5");
            self.register("claude", Arc::new(ClaudeProvider::new(config)));
            found.push("claude".to_string());
        }
        if let Ok(key) = std::env::var(OPENAI_API_KEY_ENV) {
            self.register("openai", Arc::new(OpenAiCompatProvider::openai(&key, "gpt-4o")));
            found.push("openai".to_string());
        }
        if let Ok(key) = std::env::var(ZAI_API_KEY_ENV) {
            self.register("zai", Arc::new(ZaiProvider::new(&key)));
            found.push("zai".to_string());
        }

        self.register("lm-studio", Arc::new(OpenAiCompatProvider::lm_studio()));
        found.push("lm-studio".to_string());

        found
    }

    fn register(&self, id: &str, provider: Arc<dyn LlmProvider>) {
        let mut providers = self.providers.write().unwrap_or_else(|e| e.into_inner());
        providers.insert(id.to_string(), provider);
        drop(providers);

        let mut active = self.active.write().unwrap_or_else(|e| e.into_inner());
        if active.is_none() {
            *active = Some(id.to_string());
        }
    }

    /// Register or replace a provider under `id` with a freshly supplied
    /// API key (§4.6 `setApiKey`).
    pub fn set_api_key(&self, id: &str, api_key: &str) -> HostResult<()> {
        match id {
            "claude" => {
                let config = ProviderConfig::new(api_key, "claude-sonnet-4-5");
                self.register(id, Arc::new(ClaudeProvider::new(config)));
                Ok(())
            },
            "openai" => {
                self.register(id, Arc::new(OpenAiCompatProvider::openai(api_key, "gpt-4o")));
                Ok(())
            },
            "zai" => {
                self.register(id, Arc::new(ZaiProvider::new(api_key)));
                Ok(())
            },
            other => Err(HostError::NotFound(format!("unknown provider: {other}"))),
        }
    }

    /// Drop a provider's credentials, removing it from the registry.
    pub fn remove_api_key(&self, id: &str) {
        let mut providers = self.providers.write().unwrap_or_else(|e| e.into_inner());
        providers.remove(id);
        drop(providers);

        let mut active = self.active.write().unwrap_or_else(|e| e.into_inner());
        if active.as_deref() == Some(id) {
            *active = None;
        }
    }

    /// List every registered provider with its configured/active state.
    #[must_use]
    pub fn list(&self) -> Vec<ProviderDescriptor> {
        let providers = self.providers.read().unwrap_or_else(|e| e.into_inner());
        providers
            .iter()
            .map(|(id, p)| ProviderDescriptor {
                id: id.clone(),
                configured: true,
                model: Some(p.model().to_string()),
            })
            .collect()
    }

    /// List the active provider's known model names. `harbor-llm`
    /// providers do not expose a model catalog beyond their configured
    /// model, so this returns a single-element list.
    pub fn list_models(&self) -> HostResult<Vec<String>> {
        Ok(vec![self.active_provider()?.model().to_string()])
    }

    /// Set the active provider by id.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::NotFound`] if `id` is not registered.
    pub fn set_active(&self, id: &str) -> HostResult<()> {
        let providers = self.providers.read().unwrap_or_else(|e| e.into_inner());
        if !providers.contains_key(id) {
            return Err(HostError::NotFound(format!("unknown provider: {id}")));
        }
        drop(providers);
        *self.active.write().unwrap_or_else(|e| e.into_inner()) = Some(id.to_string());
        Ok(())
    }

    /// The currently active provider, for direct `chat` calls and for
    /// building the Chat Orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::NotFound`] if no provider has been detected
    /// or set active.
    pub fn active_provider(&self) -> HostResult<Arc<dyn LlmProvider>> {
        let active = self.active.read().unwrap_or_else(|e| e.into_inner());
        let id = active.as_ref().ok_or_else(|| HostError::NotFound("no active LLM provider".to_string()))?;
        let providers = self.providers.read().unwrap_or_else(|e| e.into_inner());
        providers
            .get(id)
            .cloned()
            .ok_or_else(|| HostError::NotFound(format!("unknown provider: {id}")))
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_registered_provider_becomes_active() {
        let registry = ProviderRegistry::new();
        registry.set_api_key("claude", "sk-test").unwrap();
        assert_eq!(registry.active_provider().unwrap().name(), "claude");
    }

    #[test]
    fn set_active_rejects_unknown_provider() {
        let registry = ProviderRegistry::new();
        assert!(matches!(registry.set_active("nope"), Err(HostError::NotFound(_))));
    }

    #[test]
    fn remove_api_key_clears_active_if_it_was_the_removed_provider() {
        let registry = ProviderRegistry::new();
        registry.set_api_key("claude", "sk-test").unwrap();
        registry.remove_api_key("claude");
        assert!(registry.active_provider().is_err());
    }

    #[test]
    fn no_active_provider_before_detect_or_set_api_key() {
        let registry = ProviderRegistry::new();
        assert!(registry.active_provider().is_err());
    }
}
