use rand::Rng;

use crate::config::{BatchStrategy, PipelineSettings};
use crate::model::{ChatRequest, TokenLimitField, supports_temperature};
use crate::prompts::{PromptCatalog, pick};

const PROMPT_TOKENS: u32 = 256;
const QUESTION_TOKENS: u32 = 64;
const ANSWER_TOKENS: u32 = 256;
const RETRY_QUESTION_FLOOR: u32 = 128;
const RETRY_ANSWER_FLOOR: u32 = 512;
const QUESTION_TEMPERATURE: f32 = 1.5;
const RETRY_TEMPERATURE: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Prompt,
    Question,
    RetryQuestion,
    Answer,
    RetryAnswer,
    AvoidRepeat,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Question => "question",
            Self::RetryQuestion => "retry-question",
            Self::Answer => "answer",
            Self::RetryAnswer => "retry-answer",
            Self::AvoidRepeat => "avoid-repeat",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    model: String,
    token_limit: Option<u32>,
    temperature: Option<f32>,
    batch_count: u32,
    batch_token_multiplier: u32,
    batch_strategy: BatchStrategy,
}

impl RequestBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self::from_settings(model, &PipelineSettings::default())
    }

    pub fn from_settings(model: impl Into<String>, settings: &PipelineSettings) -> Self {
        Self {
            model: model.into(),
            token_limit: None,
            temperature: None,
            batch_count: settings.batch_count,
            batch_token_multiplier: settings.batch_token_multiplier,
            batch_strategy: settings.batch_strategy,
        }
    }

    /// A user limit replaces every stage default; retry floors still apply.
    pub fn with_token_limit(mut self, token_limit: Option<u32>) -> Self {
        self.token_limit = token_limit.filter(|limit| *limit > 0);
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Models without temperature get several questions per call instead.
    pub fn batches_questions(&self) -> bool {
        !supports_temperature(&self.model) && self.batch_count > 1
    }

    /// Budget of the first question call, scaled when several questions
    /// share one completion.
    fn question_budget(&self) -> u32 {
        let base = self.token_limit.unwrap_or(QUESTION_TOKENS);
        if self.batches_questions() && self.batch_strategy == BatchStrategy::Prompt {
            base.saturating_mul(self.batch_token_multiplier)
        } else {
            base
        }
    }

    pub fn token_limit(&self, stage: Stage) -> u32 {
        let base = |default: u32| self.token_limit.unwrap_or(default);
        match stage {
            Stage::Prompt => base(PROMPT_TOKENS),
            Stage::Question => self.question_budget(),
            Stage::RetryQuestion => self.question_budget().max(RETRY_QUESTION_FLOOR),
            Stage::Answer => base(ANSWER_TOKENS),
            Stage::RetryAnswer | Stage::AvoidRepeat => base(ANSWER_TOKENS).max(RETRY_ANSWER_FLOOR),
        }
    }

    pub fn temperature(&self, stage: Stage) -> Option<f32> {
        if !supports_temperature(&self.model) {
            return None;
        }
        if self.temperature.is_some() {
            return self.temperature;
        }
        match stage {
            Stage::Question | Stage::RetryQuestion => Some(QUESTION_TEMPERATURE),
            Stage::RetryAnswer | Stage::AvoidRepeat => Some(RETRY_TEMPERATURE),
            Stage::Prompt | Stage::Answer => None,
        }
    }

    pub fn build(
        &self,
        stage: Stage,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            token_limit: self.token_limit(stage),
            token_limit_field: TokenLimitField::for_model(&self.model),
            temperature: self.temperature(stage),
            completions: None,
        }
    }

    pub fn prompt(&self, prompts: &PromptCatalog, prompt: &str) -> ChatRequest {
        self.build(Stage::Prompt, prompts.prompt_system.clone(), prompt)
    }

    pub fn question<R: Rng + ?Sized>(
        &self,
        prompts: &PromptCatalog,
        topic: &str,
        rng: &mut R,
    ) -> ChatRequest {
        let system = pick(&prompts.question_systems, rng).to_string();
        if !self.batches_questions() {
            return self.build(Stage::Question, system, prompts.question_prompt(topic, rng));
        }

        match self.batch_strategy {
            BatchStrategy::Prompt => {
                let user = prompts.batch_question_prompt(topic, self.batch_count, rng);
                self.build(Stage::Question, system, user)
            }
            BatchStrategy::Choices => {
                let mut request =
                    self.build(Stage::Question, system, prompts.question_prompt(topic, rng));
                request.completions = Some(self.batch_count);
                request
            }
        }
    }

    pub fn retry_question<R: Rng + ?Sized>(
        &self,
        prompts: &PromptCatalog,
        topic: &str,
        rng: &mut R,
    ) -> ChatRequest {
        let system = pick(&prompts.question_systems, rng).to_string();
        self.build(
            Stage::RetryQuestion,
            system,
            prompts.retry_question_prompt(topic, rng),
        )
    }

    pub fn answer(&self, prompts: &PromptCatalog, question: &str) -> ChatRequest {
        self.build(Stage::Answer, prompts.answer_system.clone(), question)
    }

    pub fn retry_answer(&self, prompts: &PromptCatalog, question: &str) -> ChatRequest {
        self.build(Stage::RetryAnswer, prompts.retry_answer_system.clone(), question)
    }

    pub fn avoid_repeat(
        &self,
        prompts: &PromptCatalog,
        question: &str,
        previous: &[String],
    ) -> ChatRequest {
        self.build(
            Stage::AvoidRepeat,
            prompts.avoid_repeat_system.clone(),
            prompts.avoid_repeat_prompt(question, previous),
        )
    }
}
