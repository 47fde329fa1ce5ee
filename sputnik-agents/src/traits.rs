//! Common traits for analysis agents

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use sputnik_core::ArtifactType;

use crate::{Analysis, LlmError, PersonaError};

/// Shown instead of analysis text when the analysis call fails
pub const ANALYSIS_FAILED: &str = "Failed to analyze artifact. Please try again later.";

/// Errors from agent operations
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Prompt error: {0}")]
    Prompt(#[from] PersonaError),

    #[error("No artifact to analyze")]
    NoWork,
}

/// Produces advisory prose about a single artifact
#[async_trait]
pub trait ArtifactAnalysis: Send + Sync {
    /// Analyze a normalized artifact of a known or unknown type
    async fn analyze(
        &self,
        artifact: &str,
        artifact_type: ArtifactType,
    ) -> Result<Analysis, AgentError>;

    /// Analyze, replacing any failure with a fixed message
    async fn analyze_or_fallback(&self, artifact: &str, artifact_type: ArtifactType) -> String {
        match self.analyze(artifact, artifact_type).await {
            Ok(analysis) => analysis.markdown,
            Err(e) => {
                warn!("Analysis of {} failed: {}", artifact_type.as_str(), e);
                ANALYSIS_FAILED.to_string()
            }
        }
    }
}
