use clap::Parser;

pub const DEFAULT_TOPIC: &str = "anything at all";

#[derive(Debug, Parser)]
#[command(name = "askgpt")]
#[command(about = "Ask a chat model a question, or let it ask and answer its own", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Model to use (defaults to $MODEL, then gpt-5)
    #[arg(long, short = 'm')]
    pub model: Option<String>,

    /// Maximum tokens for every completion
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_tokens: Option<u32>,

    /// Print per-call timing information
    #[arg(long)]
    pub debug: bool,

    /// Generate a random question and answer it
    #[arg(long)]
    pub random: bool,

    /// Topic for random mode
    #[arg(long, short = 't', default_value = DEFAULT_TOPIC)]
    pub topic: String,

    /// Number of candidate questions to request from models without temperature
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub n: Option<u32>,

    /// Sampling temperature (ignored by models that reject it)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Prompt for normal mode
    pub prompt: Vec<String>,
}

impl Cli {
    /// Joined prompt words, or `None` when nothing usable was given.
    pub fn prompt_text(&self) -> Option<String> {
        let prompt = self.prompt.join(" ");
        if prompt.trim().is_empty() {
            None
        } else {
            Some(prompt)
        }
    }
}
