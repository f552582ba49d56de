use std::time::Duration;

use serde::Serialize;

use crate::error::ConfigError;
use crate::intent::bootstrap::DEFAULT_ANALYZER_CEILING;

pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_MODEL: &str = "llama3.2:1b";

#[derive(Debug, Clone, Serialize)]
pub struct JokeBotConfig {
    pub server: ServerConfig,
    pub nlp: NlpConfig,
    pub model: ModelConfig,
    pub generation: GenerationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NlpEngineKind {
    Lexicon,
    None,
}

#[derive(Debug, Clone, Serialize)]
pub struct NlpConfig {
    pub engine: NlpEngineKind,
    /// Ceiling on analyzer initialization before falling back to patterns.
    pub wait_ceiling: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BackendKind {
    Ollama,
    None,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelConfig {
    pub backend: BackendKind,
    pub endpoint: String,
    pub default_model: String,
    /// Registry of selectable model ids. Always contains `default_model`.
    pub available_models: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for JokeBotConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            nlp: NlpConfig {
                engine: NlpEngineKind::Lexicon,
                wait_ceiling: DEFAULT_ANALYZER_CEILING,
            },
            model: ModelConfig {
                backend: BackendKind::Ollama,
                endpoint: DEFAULT_OLLAMA_URL.to_string(),
                default_model: DEFAULT_MODEL.to_string(),
                available_models: vec![DEFAULT_MODEL.to_string()],
            },
            generation: GenerationConfig {
                max_tokens: 100,
                temperature: 0.8,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl JokeBotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(host) = get("HOST") {
            config.server.host = host;
        }
        if let Some(port) = get("PORT") {
            config.server.port = parse("PORT", &port)?;
        }

        if let Some(engine) = get("NLP_ENGINE") {
            config.nlp.engine = match engine.to_lowercase().as_str() {
                "lexicon" | "winknlp" => NlpEngineKind::Lexicon,
                "none" | "off" => NlpEngineKind::None,
                _ => return Err(ConfigError::UnknownOption { key: "NLP_ENGINE", value: engine }),
            };
        }
        if let Some(wait) = get("NLP_WAIT_MS") {
            config.nlp.wait_ceiling = Duration::from_millis(parse("NLP_WAIT_MS", &wait)?);
        }

        if let Some(backend) = get("AI_BACKEND") {
            config.model.backend = match backend.to_lowercase().as_str() {
                "ollama" => BackendKind::Ollama,
                "none" | "off" => BackendKind::None,
                _ => return Err(ConfigError::UnknownOption { key: "AI_BACKEND", value: backend }),
            };
        }
        if let Some(url) = get("OLLAMA_URL") {
            config.model.endpoint = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = get("DEFAULT_AI_MODEL") {
            config.model.default_model = model;
        }

        let mut registry: Vec<String> = get("AI_MODELS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        if !registry.contains(&config.model.default_model) {
            registry.insert(0, config.model.default_model.clone());
        }
        config.model.available_models = registry;

        if let Some(tokens) = get("GEN_MAX_TOKENS") {
            config.generation.max_tokens = parse("GEN_MAX_TOKENS", &tokens)?;
        }
        if let Some(temperature) = get("GEN_TEMPERATURE") {
            let value: f32 = parse("GEN_TEMPERATURE", &temperature)?;
            if !(0.0..=2.0).contains(&value) {
                return Err(ConfigError::Invalid { key: "GEN_TEMPERATURE", value: temperature });
            }
            config.generation.temperature = value;
        }

        if let Some(level) = get("LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = JokeBotConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.model.default_model, DEFAULT_MODEL);
        assert_eq!(config.model.available_models, vec![DEFAULT_MODEL.to_string()]);
        assert_eq!(config.nlp.wait_ceiling, Duration::from_millis(15_000));
        assert_eq!(config.generation.max_tokens, 100);
    }

    #[test]
    fn registry_always_contains_default_model() {
        let config = JokeBotConfig::from_lookup(lookup(&[
            ("DEFAULT_AI_MODEL", "phi3:mini"),
            ("AI_MODELS", "llama3.2:1b, gemma2:2b"),
        ]))
        .unwrap();
        assert_eq!(
            config.model.available_models,
            vec!["phi3:mini", "llama3.2:1b", "gemma2:2b"]
        );
    }

    #[test]
    fn rejects_bad_numbers_and_options() {
        assert!(matches!(
            JokeBotConfig::from_lookup(lookup(&[("PORT", "eighty")])),
            Err(ConfigError::Invalid { key: "PORT", .. })
        ));
        assert!(matches!(
            JokeBotConfig::from_lookup(lookup(&[("AI_BACKEND", "gpt")])),
            Err(ConfigError::UnknownOption { key: "AI_BACKEND", .. })
        ));
        assert!(JokeBotConfig::from_lookup(lookup(&[("GEN_TEMPERATURE", "9")])).is_err());
    }

    #[test]
    fn pattern_only_and_offline_modes() {
        let config = JokeBotConfig::from_lookup(lookup(&[
            ("NLP_ENGINE", "none"),
            ("AI_BACKEND", "none"),
            ("OLLAMA_URL", "http://box:11434/"),
        ]))
        .unwrap();
        assert_eq!(config.nlp.engine, NlpEngineKind::None);
        assert_eq!(config.model.backend, BackendKind::None);
        assert_eq!(config.model.endpoint, "http://box:11434");
    }
}
