use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use spendlens_llm::pipeline::{QueryOutcome, QuerySuccess};
use std::io::{self, Write};

/// How many matched rows to print before eliding.
const ROW_LIMIT: usize = 10;

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const USER_PROMPT: Color = Color::Green;
    const SUMMARY: Color = Color::Cyan;
    const RULE: Color = Color::Yellow;
    const ERROR: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
    const HEADER: Color = Color::Magenta;
}

/// Manages terminal I/O for the interactive loop.
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }

    /// Print the startup banner.
    pub fn print_banner(&self, provider: &str, record_count: usize) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("spendlens"),
            ResetColor,
            Print(" - ask questions about your transactions\n"),
            SetForegroundColor(Colors::DIM),
            Print(format!(
                "Provider: {} | {} transactions loaded\n",
                provider, record_count
            )),
            Print("Type 'exit' or 'quit' to end.\n"),
            Print("---\n"),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Read a line of user input with prompt.
    /// Returns None if the user wants to exit.
    pub fn read_input(&self) -> Result<Option<String>> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(Colors::USER_PROMPT),
            Print("ask> "),
            ResetColor,
        )?;
        stdout.flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        let trimmed = input.trim().to_string();

        if trimmed == "exit" || trimmed == "quit" || trimmed == "/exit" || trimmed == "/quit" {
            return Ok(None);
        }

        Ok(Some(trimmed))
    }

    /// Render a query outcome: rule, a slice of the matches, stats, summary.
    pub fn print_outcome(&self, outcome: &QueryOutcome) -> Result<()> {
        match outcome {
            QueryOutcome::Success(success) => self.print_success(success),
            QueryOutcome::Failure(failure) => {
                self.print_error(&failure.error)?;
                if let Some(help) = &failure.help_message {
                    self.print_dim(help)?;
                }
                Ok(())
            }
        }
    }

    fn print_success(&self, success: &QuerySuccess) -> Result<()> {
        let mut stdout = io::stdout();

        let rule_json = serde_json::to_string_pretty(&success.generated_rule)?;
        execute!(
            stdout,
            SetForegroundColor(Colors::RULE),
            Print("rule\n"),
            ResetColor,
            Print(rule_json),
            Print("\n\n"),
        )?;

        execute!(
            stdout,
            SetForegroundColor(Colors::RULE),
            Print(format!(
                "matches  {} of {} ({:.1}%)\n",
                success.results.match_count,
                success.results.total_transactions,
                success.results.match_percentage
            )),
            ResetColor,
        )?;
        if success.results.skipped > 0 {
            self.print_dim(&format!(
                "{} skipped during evaluation",
                success.results.skipped
            ))?;
        }
        for record in success.matched_transactions.iter().take(ROW_LIMIT) {
            let line = record
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("  ");
            execute!(stdout, Print(format!("  {}\n", line)))?;
        }
        if success.matched_transactions.len() > ROW_LIMIT {
            self.print_dim(&format!(
                "… {} more",
                success.matched_transactions.len() - ROW_LIMIT
            ))?;
        }

        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(Colors::SUMMARY),
            Print(&success.summary),
            ResetColor,
            Print("\n"),
        )?;
        stdout.flush()?;
        Ok(())
    }

    pub fn print_info(&self, message: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, Print(message), Print("\n"))?;
        stdout.flush()?;
        Ok(())
    }

    pub fn print_error(&self, message: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::ERROR),
            Print("error: "),
            ResetColor,
            Print(message),
            Print("\n"),
        )?;
        stdout.flush()?;
        Ok(())
    }

    fn print_dim(&self, message: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print(message),
            ResetColor,
            Print("\n"),
        )?;
        stdout.flush()?;
        Ok(())
    }
}
