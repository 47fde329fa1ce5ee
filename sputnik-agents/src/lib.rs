//! Sputnik Agents
//!
//! LLM-backed helpers around the artifact classifier:
//! - **Backends**: Gemini, Anthropic and OpenAI-compatible chat APIs
//! - **Analyst**: advisory investigation strategy for one artifact
//!
//! ## Personas
//!
//! The analyst prompt is defined in `prompts/analyst.toml` and can be
//! replaced at runtime. See [`persona::Persona`].

pub mod analyst;
pub mod backend;
pub mod persona;
pub mod traits;

pub use analyst::*;
pub use backend::*;
pub use persona::*;
pub use traits::*;
