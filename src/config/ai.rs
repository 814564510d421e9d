//! Chat generation configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::application::handlers::chat::StreamChatConfig;

/// Chat generation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Model identifier passed to the provider
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl AiConfig {
    /// Generation parameters for the chat handler
    pub fn stream_chat_config(&self) -> StreamChatConfig {
        StreamChatConfig {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.model.trim().is_empty() {
            return Err(ValidationError::MissingRequired("AI__MODEL"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidTemperature);
        }
        if self.max_tokens == 0 {
            return Err(ValidationError::InvalidMaxTokens);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_model() -> String {
    "mock-model-1".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AiConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stream_chat_config().max_tokens, 1024);
    }

    #[test]
    fn test_temperature_out_of_range() {
        let config = AiConfig {
            temperature: 2.5,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTemperature));
    }

    #[test]
    fn test_zero_max_tokens() {
        let config = AiConfig {
            max_tokens: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidMaxTokens));
    }

    #[test]
    fn test_blank_model() {
        let config = AiConfig {
            model: " ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired(_))
        ));
    }
}
