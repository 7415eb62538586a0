//! Provider profiles: credentials, endpoints and default models

use anyhow::{bail, Result};

use crate::config::{InferenceConfig, ProviderKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderProfile {
    pub kind: ProviderKind,
    pub api_key_env: &'static str,
    pub default_base_url: &'static str,
    pub default_model: &'static str,
    /// Environment variable that overrides `default_model`
    pub model_env: &'static str,
}

const OPENAI: ProviderProfile = ProviderProfile {
    kind: ProviderKind::Openai,
    api_key_env: "OPENAI_API_KEY",
    default_base_url: "https://api.openai.com/v1",
    default_model: "gpt-4.1-mini",
    model_env: "FACTCHECK_MODEL",
};

const GEMINI: ProviderProfile = ProviderProfile {
    kind: ProviderKind::Gemini,
    api_key_env: "GEMINI_API_KEY",
    default_base_url: "https://generativelanguage.googleapis.com/v1beta/openai",
    default_model: "gemini-2.0-flash",
    model_env: "FACTCHECK_GEMINI_MODEL",
};

impl ProviderProfile {
    pub fn for_kind(kind: ProviderKind) -> &'static ProviderProfile {
        match kind {
            ProviderKind::Openai => &OPENAI,
            ProviderKind::Gemini => &GEMINI,
        }
    }

    /// Explicit model, else the profile's env override, else its default
    pub fn resolve_model(&self, requested: Option<&str>) -> String {
        if let Some(model) = non_blank(requested) {
            return model.to_string();
        }
        std::env::var(self.model_env)
            .ok()
            .filter(|m| !m.trim().is_empty())
            .map(|m| m.trim().to_string())
            .unwrap_or_else(|| self.default_model.to_string())
    }

    pub fn resolve_base_url(&self, requested: Option<&str>) -> String {
        non_blank(requested)
            .unwrap_or(self.default_base_url)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn api_key(&self) -> Result<String> {
        match std::env::var(self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => bail!("{} is not set.", self.api_key_env),
        }
    }
}

/// Connection settings resolved from an [`InferenceConfig`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInference {
    pub kind: ProviderKind,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub request_timeout_seconds: u64,
}

impl ResolvedInference {
    pub fn from_config(config: &InferenceConfig) -> Result<Self> {
        let profile = ProviderProfile::for_kind(config.provider);
        Ok(Self {
            kind: config.provider,
            model: profile.resolve_model(config.model.as_deref()),
            base_url: profile.resolve_base_url(config.base_url.as_deref()),
            api_key: profile.api_key()?,
            request_timeout_seconds: config.request_timeout_seconds,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
