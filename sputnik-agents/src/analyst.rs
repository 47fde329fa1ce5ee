//! Analyst Agent
//!
//! Asks an LLM for an investigation strategy for one artifact.
//! - Input: normalized artifact + detected type
//! - Output: advisory Markdown, never consumed by the classifier

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info};

use sputnik_core::{ArtifactType, Classification};

use crate::{AgentError, ArtifactAnalysis, Persona, SharedBackend};

/// Returned when the model answers with nothing
pub const NO_ANALYSIS: &str = "No analysis generated.";

/// Advisory analysis of one artifact
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub artifact: String,
    pub artifact_type: ArtifactType,
    pub model: String,
    pub markdown: String,
}

/// Analyst agent - one prompt per artifact
pub struct ArtifactAnalyst {
    backend: SharedBackend,
    persona: Persona,
}

impl ArtifactAnalyst {
    /// Create an analyst with the embedded persona
    pub fn new(backend: SharedBackend) -> Result<Self, AgentError> {
        Ok(Self::with_persona(backend, Persona::embedded()?))
    }

    /// Create an analyst with a custom persona
    pub fn with_persona(backend: SharedBackend, persona: Persona) -> Self {
        Self { backend, persona }
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Analyze several artifacts concurrently, results in input order
    pub async fn analyze_many(
        &self,
        artifacts: &[Classification],
    ) -> Vec<Result<Analysis, AgentError>> {
        info!("Analyzing {} artifacts", artifacts.len());

        let futures: Vec<_> = artifacts
            .iter()
            .map(|c| self.analyze(&c.normalized, c.artifact_type))
            .collect();

        join_all(futures).await
    }
}

#[async_trait]
impl ArtifactAnalysis for ArtifactAnalyst {
    async fn analyze(
        &self,
        artifact: &str,
        artifact_type: ArtifactType,
    ) -> Result<Analysis, AgentError> {
        if artifact.is_empty() {
            return Err(AgentError::NoWork);
        }

        let user = self.persona.render_user(artifact, artifact_type);
        debug!(
            "Analyst prompt for {} ({} chars)",
            artifact_type.as_str(),
            user.len()
        );

        let text = self
            .backend
            .generate(self.persona.system_prompt(), &user)
            .await?;

        let markdown = if text.trim().is_empty() {
            NO_ANALYSIS.to_string()
        } else {
            text
        };

        info!(
            "Analyst produced {} chars for {} artifact via {}",
            markdown.len(),
            artifact_type.as_str(),
            self.backend.model_name()
        );

        Ok(Analysis {
            artifact: artifact.to_string(),
            artifact_type,
            model: self.backend.model_name().to_string(),
            markdown,
        })
    }
}
