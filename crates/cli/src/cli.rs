use clap::Parser;

/// Ask questions about a credit-card transaction dataset in plain
/// English; answers come back as a filter rule, the matching rows, and
/// a short summary.
#[derive(Debug, Parser)]
#[command(name = "spendlens", version, about)]
pub struct CliArgs {
    /// Path to the transactions CSV (overrides config and env).
    #[arg(long)]
    pub data: Option<String>,

    /// Backend provider: "ollama" or "openai".
    #[arg(long)]
    pub provider: Option<String>,

    /// Model name override for the chosen provider.
    #[arg(long)]
    pub model: Option<String>,

    /// API key override (OpenAI-compatible providers).
    #[arg(long)]
    pub api_key: Option<String>,

    /// Run a single query and exit instead of starting the REPL.
    #[arg(long)]
    pub query: Option<String>,

    /// Print results as JSON (implies no colored output).
    #[arg(long)]
    pub json: bool,

    /// Path to a TOML config file.
    #[arg(long)]
    pub config: Option<String>,
}
