//! Persona management for the artifact analyst
//!
//! The analyst prompt is data, loaded from TOML so it can be tuned without
//! touching code. A default persona is embedded from `prompts/analyst.toml`.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use sputnik_core::ArtifactType;

const EMBEDDED_ANALYST: &str = include_str!("../prompts/analyst.toml");

/// Errors from loading a persona
#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("Failed to read persona file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse persona: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Persona '{0}' user prompt has no {{artifact}} placeholder")]
    MissingPlaceholder(String),
}

/// A persona definition loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct Persona {
    pub persona: PersonaMetadata,
    pub prompt: PromptConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonaMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptConfig {
    pub system: String,
    /// Template with `{artifact}` and `{artifact_type}` placeholders
    pub user: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_max_tokens() -> u32 {
    2048
}

impl Persona {
    /// The built-in analyst persona
    pub fn embedded() -> Result<Self, PersonaError> {
        Self::from_toml_str(EMBEDDED_ANALYST)
    }

    /// Parse a persona from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, PersonaError> {
        let persona: Persona = toml::from_str(content)?;
        if !persona.prompt.user.contains("{artifact}") {
            return Err(PersonaError::MissingPlaceholder(persona.persona.id));
        }
        Ok(persona)
    }

    /// Load a persona from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PersonaError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Get the system prompt
    pub fn system_prompt(&self) -> &str {
        self.prompt.system.trim()
    }

    /// Fill the user template for one artifact
    pub fn render_user(&self, artifact: &str, artifact_type: ArtifactType) -> String {
        self.prompt
            .user
            .replace("{artifact_type}", artifact_type.as_str())
            .replace("{artifact}", artifact)
            .trim()
            .to_string()
    }
}
