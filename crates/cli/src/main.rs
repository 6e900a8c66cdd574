mod cli;
mod config;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;

use spendlens_catalog::FieldCatalog;
use spendlens_llm::provider::SamplingParams;
use spendlens_llm::providers::create_provider;
use spendlens_llm::QueryPipeline;

use crate::cli::CliArgs;
use crate::config::CliConfig;
use crate::terminal::Terminal;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let terminal = Terminal::new();

    // Env config layered with the TOML file, then flag overrides
    spendlens_core::config::load_dotenv();
    let mut core_config = spendlens_core::Config::from_env();
    let cli_config = CliConfig::load(args.config.as_deref())
        .context("failed to load configuration")?;
    cli_config.apply_to(&mut core_config);

    if let Some(provider) = &args.provider {
        core_config.llm.provider = provider.clone();
    }
    if let Some(model) = &args.model {
        match core_config.llm.provider.as_str() {
            "ollama" => core_config.ollama.model = model.clone(),
            _ => core_config.llm.openai_model = model.clone(),
        }
    }
    if let Some(key) = &args.api_key {
        core_config.llm.openai_api_key = Some(key.clone());
    }
    if let Some(data) = &args.data {
        core_config.data.csv_path = data.clone().into();
    }
    core_config.log_summary();

    // Load the record set once; it is read-only from here on
    let catalog = FieldCatalog::transactions();
    let records = spendlens_ingest::load_transactions(&core_config.data.csv_path, &catalog)
        .with_context(|| {
            format!(
                "failed to load transactions from {}",
                core_config.data.csv_path.display()
            )
        })?;

    let provider = create_provider(&core_config.llm, &core_config.ollama)
        .context("failed to create LLM provider")?;

    let pipeline = QueryPipeline::new(
        provider,
        catalog,
        records,
        SamplingParams {
            temperature: core_config.llm.rule_temperature,
            nucleus_p: 0.9,
            max_tokens: core_config.llm.max_tokens,
        },
        SamplingParams {
            temperature: core_config.llm.summary_temperature,
            nucleus_p: 0.95,
            max_tokens: core_config.llm.max_tokens,
        },
    );

    // One-shot mode
    if let Some(query) = &args.query {
        let outcome = pipeline.process(query).await;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            terminal.print_outcome(&outcome)?;
        }
        return Ok(());
    }

    // REPL loop
    terminal.print_banner(&core_config.llm.provider, pipeline.record_count())?;
    loop {
        let input = match terminal.read_input()? {
            Some(text) => text,
            None => {
                terminal.print_info("Goodbye.")?;
                break;
            }
        };

        if input.is_empty() {
            continue;
        }

        let outcome = pipeline.process(&input).await;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            terminal.print_outcome(&outcome)?;
        }
    }

    Ok(())
}
