//! Sputnik CLI
//!
//! Classify OSINT artifacts, list lookup tools and ask an LLM for an
//! investigation strategy.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

use sputnik_agents::{
    create_anthropic_backend, create_backend, create_gemini_backend, AnthropicConfig,
    ArtifactAnalyst, GeminiConfig, OpenAIBackendConfig, Persona, SharedBackend, ANALYSIS_FAILED,
};
use sputnik_core::{Classification, ServiceRegistry, ToolLink, OPEN_ALL_CONFIRM_THRESHOLD};

const EMPTY_HINT: &str = "Enter an IP, Domain, Hash, or URL to see available tools.";
const UNKNOWN_HINT: &str = "Could not automatically detect artifact type. Please check the format.";

#[derive(Parser)]
#[command(name = "sputnik")]
#[command(author, version, about = "Sputnik: OSINT artifact triage", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize and detect the type of one or more artifacts
    Classify {
        /// Artifacts (defanged input is accepted)
        #[arg(required = true)]
        artifacts: Vec<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List lookup tools for an artifact
    Tools {
        /// The artifact to look up
        artifact: String,

        /// Service table to use instead of the built-in one
        #[arg(long, env = "SPUTNIK_SERVICES")]
        services: Option<PathBuf>,

        /// Open every tool in the default browser
        #[arg(long)]
        open: bool,

        /// Skip the confirmation needed to open many tabs
        #[arg(short, long)]
        yes: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Ask an LLM for an investigation strategy
    Analyze {
        /// Artifacts to analyze
        #[arg(required = true)]
        artifacts: Vec<String>,

        #[command(flatten)]
        backend: BackendArgs,

        /// Persona TOML to use instead of the built-in analyst prompt
        #[arg(long, env = "SPUTNIK_PERSONA")]
        persona: Option<PathBuf>,

        /// Save the analysis as Markdown
        #[arg(long)]
        save: bool,

        /// Output file for --save (default: analysis_<timestamp>.md)
        #[arg(short, long, requires = "save")]
        output: Option<PathBuf>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Classify each line read from stdin as it arrives
    Watch {
        /// Print one JSON object per line
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct BackendArgs {
    /// LLM model to use (default depends on provider)
    #[arg(short, long)]
    model: Option<String>,

    /// Gemini API key (or set GEMINI_API_KEY / API_KEY env var)
    #[arg(long, env = "GEMINI_API_KEY")]
    gemini_key: Option<String>,

    /// Anthropic API key (or set ANTHROPIC_API_KEY env var)
    #[arg(long, env = "ANTHROPIC_API_KEY")]
    anthropic_key: Option<String>,

    /// OpenAI API key (or set OPENAI_API_KEY env var)
    #[arg(long, env = "OPENAI_API_KEY")]
    api_key: Option<String>,

    /// OpenRouter API key (or set OPENROUTER_API_KEY env var)
    #[arg(long, env = "OPENROUTER_API_KEY")]
    openrouter_key: Option<String>,

    /// Use Anthropic instead of Gemini
    #[arg(long, conflicts_with_all = ["openai", "openrouter"])]
    anthropic: bool,

    /// Use OpenAI instead of Gemini
    #[arg(long, conflicts_with = "openrouter")]
    openai: bool,

    /// Use OpenRouter instead of Gemini
    #[arg(long)]
    openrouter: bool,

    /// Request timeout in seconds
    #[arg(long, default_value = "60")]
    timeout: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provider {
    Gemini,
    Anthropic,
    OpenAI,
    OpenRouter,
}

impl Provider {
    fn name(self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::Anthropic => "Anthropic",
            Provider::OpenAI => "OpenAI",
            Provider::OpenRouter => "OpenRouter",
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            Provider::Gemini => GeminiConfig::DEFAULT_MODEL,
            Provider::Anthropic => "claude-sonnet-4-20250514",
            Provider::OpenAI => "gpt-4o-mini",
            Provider::OpenRouter => "google/gemini-2.5-flash",
        }
    }
}

impl BackendArgs {
    fn provider(&self) -> Provider {
        if self.openrouter {
            Provider::OpenRouter
        } else if self.openai {
            Provider::OpenAI
        } else if self.anthropic {
            Provider::Anthropic
        } else {
            Provider::Gemini
        }
    }

    fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider().default_model())
    }

    fn build(&self, max_tokens: u32) -> Result<SharedBackend> {
        let model = self.model();

        let backend = match self.provider() {
            Provider::Gemini => {
                let key = self
                    .gemini_key
                    .clone()
                    .or_else(|| std::env::var("API_KEY").ok())
                    .ok_or_else(|| {
                        anyhow::anyhow!("Gemini API key not configured. Set GEMINI_API_KEY or use --gemini-key")
                    })?;
                let mut config = GeminiConfig::new(&key, model);
                config.max_tokens = max_tokens;
                config.timeout_secs = self.timeout;
                create_gemini_backend(config)?
            }
            Provider::Anthropic => {
                let key = self.anthropic_key.as_deref().ok_or_else(|| {
                    anyhow::anyhow!("Anthropic API key required. Set ANTHROPIC_API_KEY or use --anthropic-key")
                })?;
                let mut config = AnthropicConfig::new(key, model);
                config.max_tokens = max_tokens;
                config.timeout_secs = self.timeout;
                create_anthropic_backend(config)?
            }
            Provider::OpenAI => {
                let key = self.api_key.as_deref().ok_or_else(|| {
                    anyhow::anyhow!("OpenAI API key required. Set OPENAI_API_KEY or use --api-key")
                })?;
                let mut config = OpenAIBackendConfig::openai(key, model);
                config.max_tokens = u16::try_from(max_tokens).unwrap_or(u16::MAX);
                create_backend(config)?
            }
            Provider::OpenRouter => {
                let key = self.openrouter_key.as_deref().ok_or_else(|| {
                    anyhow::anyhow!("OpenRouter API key required. Set OPENROUTER_API_KEY or use --openrouter-key")
                })?;
                let mut config = OpenAIBackendConfig::openrouter(key, model);
                config.max_tokens = u16::try_from(max_tokens).unwrap_or(u16::MAX);
                create_backend(config)?
            }
        };

        Ok(backend)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match cli.command {
        Commands::Classify { artifacts, json } => run_classify(&artifacts, json)?,
        Commands::Tools {
            artifact,
            services,
            open,
            yes,
            json,
        } => run_tools(&artifact, services.as_deref(), open, yes, json)?,
        Commands::Analyze {
            artifacts,
            backend,
            persona,
            save,
            output,
            json,
        } => {
            run_analyze(&artifacts, &backend, persona.as_deref(), save, output, json).await?;
        }
        Commands::Watch { json } => run_watch(json).await?,
    }

    Ok(())
}

fn describe(c: &Classification) -> String {
    if c.is_empty() {
        return "(empty)".to_string();
    }
    match c.hash_algorithm {
        Some(algo) => format!("{:<18} {} ({})", c.label, c.normalized, algo),
        None => format!("{:<18} {}", c.label, c.normalized),
    }
}

fn run_classify(artifacts: &[String], json: bool) -> Result<()> {
    let results: Vec<Classification> = artifacts.iter().map(|a| Classification::of(a)).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for c in &results {
        println!("{}", describe(c));
    }

    Ok(())
}

fn load_registry(path: Option<&Path>) -> Result<ServiceRegistry> {
    match path {
        Some(path) => ServiceRegistry::load(path)
            .with_context(|| format!("loading services from {}", path.display())),
        None => Ok(ServiceRegistry::embedded()?),
    }
}

fn unknown_hint(registry: &ServiceRegistry) -> String {
    let supported: Vec<&str> = registry.categories().map(|t| t.label()).collect();
    format!("{}\nSupported types: {}", UNKNOWN_HINT, supported.join(", "))
}

fn run_tools(
    artifact: &str,
    services: Option<&Path>,
    open_tabs: bool,
    yes: bool,
    json: bool,
) -> Result<()> {
    let registry = load_registry(services)?;
    let c = Classification::of(artifact);
    let links = registry.links(&c.normalized, c.artifact_type);

    if json {
        let out = serde_json::json!({ "classification": c, "tools": links });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if c.is_empty() {
        println!("{}", EMPTY_HINT);
        return Ok(());
    } else if !c.artifact_type.is_known() {
        println!("{}", unknown_hint(&registry));
        return Ok(());
    } else {
        println!("🔍 {} ({})\n", c.normalized, c.label);
        println!("Available Tools ({})", links.len());
        for link in &links {
            println!("  {:<22} {}", link.name, link.url);
        }
    }

    if open_tabs {
        open_links(&links, yes)?;
    }

    Ok(())
}

fn open_links(links: &[ToolLink], yes: bool) -> Result<()> {
    if links.len() > OPEN_ALL_CONFIRM_THRESHOLD && !yes {
        anyhow::bail!(
            "About to open {} tabs. This might trigger popup blockers. Re-run with --yes to continue.",
            links.len()
        );
    }

    for link in links {
        if let Err(e) = open::that(&link.url) {
            warn!("Could not open {}: {}", link.name, e);
        }
    }

    Ok(())
}

async fn run_analyze(
    artifacts: &[String],
    backend_args: &BackendArgs,
    persona_path: Option<&Path>,
    save: bool,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let persona = match persona_path {
        Some(path) => Persona::load(path)
            .with_context(|| format!("loading persona from {}", path.display()))?,
        None => Persona::embedded()?,
    };

    let backend = backend_args.build(persona.output.max_tokens)?;
    let analyst = ArtifactAnalyst::with_persona(backend, persona);

    if !json {
        println!(
            "🛰️  Sputnik - {} | provider: {} | model: {}\n",
            analyst.persona().persona.name,
            backend_args.provider().name(),
            backend_args.model()
        );
    }

    let classifications: Vec<Classification> =
        artifacts.iter().map(|a| Classification::of(a)).collect();
    let results = analyst.analyze_many(&classifications).await;

    let mut report = String::new();
    let mut json_out = Vec::new();

    for (c, result) in classifications.iter().zip(results) {
        let markdown = match result {
            Ok(analysis) => analysis.markdown,
            Err(e) => {
                warn!("Analysis of '{}' failed: {}", c.normalized, e);
                ANALYSIS_FAILED.to_string()
            }
        };

        if json {
            json_out.push(serde_json::json!({ "classification": c, "analysis": markdown }));
        } else {
            println!("{}", "=".repeat(60));
            println!("{}", describe(c));
            if !c.artifact_type.is_known() && !c.is_empty() {
                println!("⚠️  Type not detected; analyzing as UNKNOWN");
            }
            println!("{}\n\n{}\n", "=".repeat(60), markdown);
        }

        report.push_str(&format!("# {} ({})\n\n{}\n\n", c.normalized, c.label, markdown));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&json_out)?);
    }

    if save {
        let output_path = output.unwrap_or_else(|| {
            let timestamp = chrono::Utc::now().format("%Y-%m-%d_%H-%M-%S");
            PathBuf::from(format!("analysis_{}.md", timestamp))
        });
        fs::write(&output_path, &report)?;
        if !json {
            println!("📄 Analysis saved to: {}", output_path.display());
        }
    }

    Ok(())
}

async fn run_watch(json: bool) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let c = Classification::of(&line);
        if json {
            println!("{}", serde_json::to_string(&c)?);
        } else if c.is_empty() || c.artifact_type.is_known() {
            println!("{}", describe(&c));
        } else {
            println!("{:<18} {} (type not detected)", c.label, c.normalized);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_provider_is_gemini() {
        let cli = Cli::try_parse_from(["sputnik", "analyze", "8.8.8.8"]).unwrap();
        let Commands::Analyze { backend, .. } = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(backend.provider(), Provider::Gemini);
        assert_eq!(backend.model(), "gemini-2.5-flash");
    }

    #[test]
    fn test_provider_flags() {
        let cli = Cli::try_parse_from(["sputnik", "analyze", "--anthropic", "x.com"]).unwrap();
        let Commands::Analyze { backend, .. } = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(backend.provider(), Provider::Anthropic);
        assert_eq!(backend.model(), "claude-sonnet-4-20250514");

        assert!(Cli::try_parse_from(["sputnik", "analyze", "--openai", "--openrouter", "x"]).is_err());
    }

    #[test]
    fn test_output_requires_save() {
        assert!(Cli::try_parse_from(["sputnik", "analyze", "-o", "a.md", "x"]).is_err());
    }

    #[test]
    fn test_open_many_needs_confirmation() {
        let registry = ServiceRegistry::embedded().unwrap();
        let links = registry.links("8.8.8.8", sputnik_core::ArtifactType::Ip);
        assert!(links.len() > OPEN_ALL_CONFIRM_THRESHOLD);
        assert!(open_links(&links, false).is_err());
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(&Classification::of("  ")), "(empty)");
        let line = describe(&Classification::of("d41d8cd98f00b204e9800998ecf8427e"));
        assert!(line.starts_with("File Hash"));
        assert!(line.ends_with("(MD5)"));
        let line = describe(&Classification::of(&"a".repeat(64)));
        assert!(line.ends_with("(SHA256)"));
    }

    #[test]
    fn test_unknown_hint_lists_supported_types() {
        let hint = unknown_hint(&ServiceRegistry::embedded().unwrap());
        assert!(hint.starts_with(UNKNOWN_HINT));
        assert!(hint.ends_with("Supported types: IP Address, Domain Name, File Hash, URL"));

        let empty = unknown_hint(&ServiceRegistry::new());
        assert!(empty.ends_with("Supported types: "));
    }

    #[test]
    fn test_load_registry_from_file() {
        let path = std::env::temp_dir().join(format!("sputnik-services-{}.toml", std::process::id()));
        fs::write(&path, "not = [valid").unwrap();
        assert!(load_registry(Some(&path)).is_err());
        fs::remove_file(&path).ok();

        assert!(!load_registry(None).unwrap().is_empty());
    }
}
