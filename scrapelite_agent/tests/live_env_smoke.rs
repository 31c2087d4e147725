use std::env;

fn run_live_tests() -> bool {
    matches!(
        env::var("RUN_LIVE_TESTS")
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[tokio::test]
async fn live_oracle_prompt_smoke() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    if !run_live_tests() {
        eprintln!("Skipping live oracle smoke test (RUN_LIVE_TESTS not enabled).");
        return Ok(());
    }

    let cfg = scrapelite_agent::OracleConfig::from_env();
    assert!(
        cfg.is_configured(),
        "RUN_LIVE_TESTS is enabled, but GROQ_API_KEY is missing"
    );

    let oracle = scrapelite_agent::Oracle::from_config(&cfg)?;
    let output = oracle
        .complete(vec![scrapelite_agent::Message::user("Reply with exactly: ok")])
        .await?;

    assert!(!output.trim().is_empty());
    assert_eq!(oracle.usage().llm_calls, 1);
    Ok(())
}

#[cfg(feature = "chrome")]
#[tokio::test]
async fn live_chrome_scrape_smoke() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    if !run_live_tests() {
        eprintln!("Skipping live Chrome smoke test (RUN_LIVE_TESTS not enabled).");
        return Ok(());
    }

    let _ = env_logger::builder().is_test(true).try_init();

    let agent = scrapelite_agent::ScrapeAgent::builder()
        .with_config(
            scrapelite_agent::ScrapeConfig::new()
                .with_headless(true)
                .with_required_fields(["title"]),
        )
        .build()?;

    let report = agent
        .scrape("https://example.com", "get the page heading as title")
        .await?;

    assert_eq!(
        report.states.last(),
        Some(&scrapelite_agent::LoopState::Done)
    );
    assert!(report.result.valid, "{:?}", report.result.errors);
    Ok(())
}
