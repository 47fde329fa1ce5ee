//! Lookup tool registry
//!
//! Maps each artifact category to the external tools that can investigate it.
//! The table is data: a default set is embedded from `services.toml` and can
//! be replaced by a user file with the same layout.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use thiserror::Error;

use crate::ArtifactType;

/// Default tool table
const DEFAULT_SERVICES: &str = include_str!("../services.toml");

/// Errors from loading a tool table
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Failed to read service file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse service file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Service '{0}' cannot be routed to UNKNOWN artifacts")]
    UnknownCategory(String),

    #[error("Duplicate service id: {0}")]
    DuplicateId(String),

    #[error("Service '{0}' has no {{artifact}} placeholder in its URL template")]
    MissingPlaceholder(String),
}

/// An external lookup tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Stable identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Category this tool accepts
    pub category: ArtifactType,
    /// URL template with {artifact} or {artifact_encoded} placeholder
    pub url_template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Service {
    /// Build the lookup URL for a normalized artifact
    pub fn build_url(&self, artifact: &str) -> String {
        self.url_template
            .replace("{artifact_encoded}", &urlencoding::encode(artifact))
            .replace("{artifact}", artifact)
    }

    fn has_placeholder(&self) -> bool {
        self.url_template.contains("{artifact}") || self.url_template.contains("{artifact_encoded}")
    }
}

/// A resolved tool link for one artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolLink {
    pub id: String,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct ServiceFile {
    #[serde(default, rename = "service")]
    services: Vec<Service>,
}

/// Registry of lookup tools by category
#[derive(Debug, Default, Clone)]
pub struct ServiceRegistry {
    services: BTreeMap<ArtifactType, Vec<Service>>,
}

impl ServiceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the built-in tool table
    pub fn embedded() -> Result<Self, ServiceError> {
        Self::from_toml_str(DEFAULT_SERVICES)
    }

    /// Parse a tool table from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ServiceError> {
        let file: ServiceFile = toml::from_str(content)?;

        let mut registry = Self::new();
        let mut seen = HashSet::new();
        for service in file.services {
            if !seen.insert(service.id.clone()) {
                return Err(ServiceError::DuplicateId(service.id));
            }
            registry.register(service)?;
        }

        Ok(registry)
    }

    /// Load a tool table from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ServiceError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Register a tool, keeping insertion order within its category
    pub fn register(&mut self, service: Service) -> Result<(), ServiceError> {
        if !service.category.is_known() {
            return Err(ServiceError::UnknownCategory(service.id));
        }
        if !service.has_placeholder() {
            return Err(ServiceError::MissingPlaceholder(service.id));
        }

        self.services.entry(service.category).or_default().push(service);
        Ok(())
    }

    /// Tools for a category; empty for UNKNOWN
    pub fn services_for(&self, artifact_type: ArtifactType) -> &[Service] {
        self.services
            .get(&artifact_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolve every tool URL for a normalized artifact
    pub fn links(&self, artifact: &str, artifact_type: ArtifactType) -> Vec<ToolLink> {
        if artifact.is_empty() {
            return Vec::new();
        }

        self.services_for(artifact_type)
            .iter()
            .map(|service| ToolLink {
                id: service.id.clone(),
                name: service.name.clone(),
                url: service.build_url(artifact),
            })
            .collect()
    }

    /// Categories that have at least one tool
    pub fn categories(&self) -> impl Iterator<Item = ArtifactType> + '_ {
        self.services.keys().copied()
    }

    /// Total number of tools
    pub fn len(&self) -> usize {
        self.services.values().map(Vec::len).sum()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
