//! Random question generation and answering with retry, fallback and
//! history-based dedup.
//!
//! A question costs one or two remote calls; an answer costs one to three.

pub mod quality;
pub mod request_builder;

use anyhow::Result;
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::PipelineSettings;
use crate::history::HistoryStore;
use crate::model::{ChatRequest, ChatResponse};
use crate::model_gateway::ChatGateway;
use crate::prompts::PromptCatalog;

use quality::{ResponseQualityFilter, Verdict, is_duplicate, pick_question};
pub use request_builder::{RequestBuilder, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallTiming {
    pub stage: Stage,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomExchange {
    pub question: String,
    pub answer: String,
}

pub struct QuestionAnswerPipeline<'a, G, H, R> {
    gateway: &'a G,
    history: &'a H,
    builder: RequestBuilder,
    filter: ResponseQualityFilter,
    prompts: PromptCatalog,
    settings: PipelineSettings,
    rng: R,
    timings: Vec<CallTiming>,
}

impl<'a, G, H, R> QuestionAnswerPipeline<'a, G, H, R>
where
    G: ChatGateway,
    H: HistoryStore,
    R: Rng,
{
    pub fn new(gateway: &'a G, history: &'a H, builder: RequestBuilder, rng: R) -> Self {
        Self {
            gateway,
            history,
            builder,
            filter: ResponseQualityFilter::default(),
            prompts: PromptCatalog::default(),
            settings: PipelineSettings::default(),
            rng,
            timings: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: ResponseQualityFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_prompts(mut self, prompts: PromptCatalog) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Durations of every remote call made so far, in call order.
    pub fn timings(&self) -> &[CallTiming] {
        &self.timings
    }

    async fn call(&mut self, stage: Stage, request: ChatRequest) -> Result<ChatResponse> {
        let start = Instant::now();
        let response = self.gateway.complete(&request).await?;
        let duration = start.elapsed();
        debug!(
            stage = stage.as_str(),
            elapsed_ms = duration.as_millis() as u64,
            choice_count = response.choices.len(),
            "remote call finished"
        );
        self.timings.push(CallTiming { stage, duration });
        Ok(response)
    }

    /// Single-shot prompt mode.
    pub async fn ask(&mut self, prompt: &str) -> Result<String> {
        let request = self.builder.prompt(&self.prompts, prompt);
        let response = self.call(Stage::Prompt, request).await?;
        Ok(response.first_text().to_string())
    }

    pub async fn generate_question(&mut self, topic: &str) -> Result<String> {
        let request = self.builder.question(&self.prompts, topic, &mut self.rng);
        let response = self.call(Stage::Question, request).await?;
        let candidate = if self.builder.batches_questions() {
            pick_question(&response.choices.join("\n"), &mut self.rng)
        } else {
            response.first_text().trim().to_string()
        };

        let verdict = self.filter.classify(&candidate, &[]);
        if verdict == Verdict::Acceptable {
            return Ok(candidate);
        }
        debug!(verdict = verdict.as_str(), "question rejected; retrying");

        let request = self
            .builder
            .retry_question(&self.prompts, topic, &mut self.rng);
        let retried = self.call(Stage::RetryQuestion, request).await?;
        let retried = retried.first_text().trim();
        if !retried.is_empty() {
            return Ok(retried.to_string());
        }

        info!(topic = %topic, "question retry came back empty; using a template");
        Ok(self.prompts.fallback_question(topic, &mut self.rng))
    }

    pub async fn answer(&mut self, question: &str) -> Result<String> {
        let loaded = self.history.load(self.settings.history_max_items);
        let window_start = loaded.len().saturating_sub(self.settings.dedup_window);
        let recent = &loaded[window_start..];

        let request = self.builder.answer(&self.prompts, question);
        let mut candidate = self
            .call(Stage::Answer, request)
            .await?
            .first_text()
            .trim()
            .to_string();

        let verdict = self.filter.classify(&candidate, recent);
        if matches!(verdict, Verdict::Empty | Verdict::Canned) {
            debug!(verdict = verdict.as_str(), "answer rejected; retrying");
            let request = self.builder.retry_answer(&self.prompts, question);
            let retried = self
                .call(Stage::RetryAnswer, request)
                .await?
                .first_text()
                .trim()
                .to_string();
            if !retried.is_empty() {
                candidate = retried;
            }
        }

        if is_duplicate(&candidate, recent) {
            let shown_start = recent.len().saturating_sub(self.settings.avoid_repeat_shown);
            let request = self
                .builder
                .avoid_repeat(&self.prompts, question, &recent[shown_start..]);
            let alternative = self
                .call(Stage::AvoidRepeat, request)
                .await?
                .first_text()
                .trim()
                .to_string();
            if !alternative.is_empty() && !is_duplicate(&alternative, recent) {
                candidate = alternative;
            } else {
                debug!("avoid-repeat answer unusable; keeping the earlier answer");
            }
        }

        if candidate.is_empty() {
            info!("no usable answer; using the fallback text");
            return Ok(self.prompts.fallback_answer.clone());
        }

        self.history
            .append(&candidate, self.settings.history_max_items);
        Ok(candidate)
    }

    pub async fn run(&mut self, topic: &str) -> Result<RandomExchange> {
        let question = self.generate_question(topic).await?;
        let answer = self.answer(&question).await?;
        Ok(RandomExchange { question, answer })
    }
}
