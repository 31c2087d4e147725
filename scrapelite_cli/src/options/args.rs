use clap::Parser;
use std::path::PathBuf;

/// drive a browser toward a goal with an LLM and extract the result as JSON.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// The website URL to start from.
    pub url: String,
    /// What to find, e.g. "get the top 5 post titles". Remaining words are joined.
    #[clap(required = true, num_args = 1..)]
    pub goal: Vec<String>,
    /// Maximum observe-plan-act cycles before extracting.
    #[clap(short, long, default_value_t = 1)]
    pub max_iterations: usize,
    /// Field the extracted JSON object must contain. Repeat for more.
    #[clap(short = 'f', long = "required-field")]
    pub required_fields: Vec<String>,
    /// Where to write the result.
    #[clap(short, long, default_value = "data.json")]
    pub output: PathBuf,
    /// Run Chrome without a window.
    #[clap(long)]
    pub headless: bool,
    /// Model name, overrides SCRAPELITE_MODEL.
    #[clap(long)]
    pub model: Option<String>,
    /// OpenAI-compatible chat completions endpoint, overrides SCRAPELITE_API_URL.
    #[clap(long)]
    pub api_url: Option<String>,
    /// Print progress logs.
    #[clap(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The goal as one string.
    pub fn goal(&self) -> String {
        self.goal.join(" ")
    }

    /// The URL with a scheme.
    pub fn url(&self) -> String {
        if self.url.starts_with("http://") || self.url.starts_with("https://") {
            self.url.clone()
        } else {
            format!("https://{}", self.url)
        }
    }
}
