extern crate env_logger;
extern crate serde_json;

pub mod options;

use clap::Parser;
use options::Cli;
use scrapelite_agent::{OracleConfig, ScrapeAgent, ScrapeConfig};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // A missing .env file is fine; the key may come from the environment.
    let _ = dotenvy::dotenv();

    {
        use env_logger::Env;
        let env = Env::default()
            .filter_or("RUST_LOG", if cli.verbose { "info" } else { "warn" })
            .write_style_or("RUST_LOG_STYLE", "always");

        env_logger::init_from_env(env);
    }

    let url = cli.url();
    let goal = cli.goal();

    let mut oracle = OracleConfig::from_env();
    if let Some(model) = cli.model.clone() {
        oracle = oracle.with_model(model);
    }
    if let Some(api_url) = cli.api_url.clone() {
        oracle = oracle.with_api_url(api_url);
    }

    let config = ScrapeConfig::new()
        .with_max_iterations(cli.max_iterations)
        .with_required_fields(cli.required_fields.clone())
        .with_headless(cli.headless)
        .with_output_path(cli.output.display().to_string());

    let agent = match ScrapeAgent::builder()
        .with_config(config)
        .with_oracle_config(oracle)
        .build()
    {
        Ok(agent) => agent,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let report = match agent.scrape(&url, &goal).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Unable to start the browser: {}", e);
            return ExitCode::FAILURE;
        }
    };

    log::info!(
        "finished after {} iteration(s) ({:?}), {} failed action(s), {} tokens",
        report.iterations,
        report.termination,
        report.actions_failed,
        report.usage.total_tokens()
    );

    let rule = "=".repeat(50);
    println!("\n{}\nRESULT:\n{}", rule, rule);
    match serde_json::to_string_pretty(&report.result) {
        Ok(pretty) => println!("{}", pretty),
        Err(e) => eprintln!("Unable to render result: {}", e),
    }

    if let Err(e) = agent.persist(&report.result).await {
        eprintln!("Unable to save result: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
