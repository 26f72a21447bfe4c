pub mod cli;
pub mod config;
pub mod history;
pub mod logging;
pub mod model;
pub mod model_gateway;
pub mod pipeline;
pub mod prompts;
pub mod providers;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use rand::SeedableRng;
use rand::rngs::StdRng;
use reqwest::Client;
use std::time::Duration;
use tracing::info;

use cli::Cli;
use config::Config;
use history::FileHistoryStore;
use model_gateway::OpenAiGateway;
use pipeline::quality::{PhraseBlocklist, ResponseQualityFilter};
use pipeline::{CallTiming, QuestionAnswerPipeline, RequestBuilder};

pub async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let cli = Cli::parse();
    let mut cfg = Config::from_env();
    if let Some(model) = cli.model.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        cfg.model = model.to_string();
    }
    if let Some(count) = cli.n {
        cfg.pipeline.batch_count = count;
    }
    info!(
        model = %cfg.model,
        base_url = %cfg.model_base_url,
        api_key_present = cfg.api_key.is_some(),
        random = cli.random,
        batch_strategy = cfg.pipeline.batch_strategy.as_str(),
        "loaded runtime configuration"
    );

    let prompt = cli.prompt_text();
    if !cli.random && prompt.is_none() {
        eprintln!("{}", Cli::command().render_help());
        bail!("prompt required when not using --random");
    }

    let client = Client::builder()
        .timeout(Duration::from_secs(cfg.model_timeout_secs))
        .build()
        .context("Failed to initialize HTTP client")?;
    let gateway = OpenAiGateway::new(&client, &cfg);
    let history = FileHistoryStore::new(cfg.history_path());
    let builder = RequestBuilder::from_settings(&cfg.model, &cfg.pipeline)
        .with_token_limit(cli.max_tokens)
        .with_temperature(cli.temperature);
    let mut pipeline =
        QuestionAnswerPipeline::new(&gateway, &history, builder, StdRng::from_entropy())
            .with_filter(ResponseQualityFilter::new(Box::new(PhraseBlocklist::new(
                &cfg.canned_phrases,
            ))))
            .with_settings(cfg.pipeline.clone());

    match prompt {
        Some(prompt) if !cli.random => {
            let output = pipeline.ask(&prompt).await?;
            println!("{}", output.trim());
            print_timings(cli.debug, pipeline.timings());
        }
        _ => {
            println!("Using model: {}", cfg.model);
            println!("Topic: {}", cli.topic);

            let question = pipeline.generate_question(&cli.topic).await?;
            println!("Question: {question}");
            let asked = pipeline.timings().len();
            print_timings(cli.debug, pipeline.timings());

            let answer = pipeline.answer(&question).await?;
            println!("\nAnswer: {answer}");
            print_timings(cli.debug, &pipeline.timings()[asked..]);
        }
    }

    Ok(())
}

fn print_timings(debug: bool, timings: &[CallTiming]) {
    if !debug {
        return;
    }
    for timing in timings {
        println!(
            "[debug] {} API call duration: {:.3} seconds",
            timing.stage.as_str(),
            timing.duration.as_secs_f64()
        );
    }
}
