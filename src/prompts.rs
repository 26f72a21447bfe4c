//! Prompt text used by the random question/answer flow.
//!
//! Every string that reaches the model lives here as data. Placeholders are
//! `{topic}`, `{seed}`, `{count}`, `{question}` and `{previous}`.

use rand::Rng;
use rand::seq::SliceRandom;

const SEED_RANGE: std::ops::RangeInclusive<u32> = 1000..=9999;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptCatalog {
    pub prompt_system: String,
    pub question_systems: Vec<String>,
    pub question_templates: Vec<String>,
    pub batch_question_template: String,
    pub retry_question_template: String,
    pub answer_system: String,
    pub retry_answer_system: String,
    pub avoid_repeat_system: String,
    pub avoid_repeat_template: String,
    pub fallback_questions: Vec<String>,
    pub fallback_answer: String,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}

impl Default for PromptCatalog {
    fn default() -> Self {
        Self {
            prompt_system: "You are a concise, accurate assistant.".to_string(),
            question_systems: owned(&[
                "You are a curious and creative assistant.",
                "You are a playful quizmaster who loves unusual questions.",
                "You are an inquisitive tutor sparking curiosity with every question.",
            ]),
            question_templates: owned(&[
                "(Seed {seed}) Generate one short, interesting question related to {topic}. Keep it concise.",
                "(Seed {seed}) Generate one random, interesting, but simple question related to {topic}. Keep it short and clear.",
                "(Seed {seed}) Ask one surprising question about {topic} that most people have never considered.",
            ]),
            batch_question_template: "(Seed {seed}) Generate {count} distinct, short, interesting questions related to {topic}. \
Put each question on its own line with no numbering, no introduction and no closing remarks."
                .to_string(),
            retry_question_template: "(Seed {seed}) Write exactly one concrete question about {topic}. \
Reply with the question only, ending with a question mark. Do not greet the user or offer help."
                .to_string(),
            answer_system: "Answer clearly and concisely.".to_string(),
            retry_answer_system: "You are a knowledgeable expert. Give a direct, factual answer to the question. \
Never reply with a greeting or an offer to help."
                .to_string(),
            avoid_repeat_system: "You are a knowledgeable expert who never repeats an earlier answer."
                .to_string(),
            avoid_repeat_template: "{question}\n\nThese answers were already given; do not repeat any of them:\n{previous}\n\n\
Give a different, clear and concise answer."
                .to_string(),
            fallback_questions: owned(&[
                "What is one surprising fact about {topic}?",
                "What is a common misconception about {topic}?",
                "How has {topic} changed over the last hundred years?",
                "Why does {topic} matter in everyday life?",
                "How would you explain {topic} to a ten-year-old?",
            ]),
            fallback_answer: "Sorry, I couldn't come up with an answer this time.".to_string(),
        }
    }
}

/// Uniform choice over configured variants; empty sets yield "".
pub fn pick<'a, R: Rng + ?Sized>(options: &'a [String], rng: &mut R) -> &'a str {
    options.choose(rng).map(String::as_str).unwrap_or_default()
}

/// Random integer embedded in prompts to discourage cached or repeated output.
pub fn entropy_seed<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(SEED_RANGE)
}

impl PromptCatalog {
    pub fn question_prompt<R: Rng + ?Sized>(&self, topic: &str, rng: &mut R) -> String {
        let seed = entropy_seed(rng);
        pick(&self.question_templates, rng)
            .replace("{seed}", &seed.to_string())
            .replace("{topic}", topic)
    }

    pub fn batch_question_prompt<R: Rng + ?Sized>(&self, topic: &str, count: u32, rng: &mut R) -> String {
        self.batch_question_template
            .replace("{seed}", &entropy_seed(rng).to_string())
            .replace("{count}", &count.to_string())
            .replace("{topic}", topic)
    }

    pub fn retry_question_prompt<R: Rng + ?Sized>(&self, topic: &str, rng: &mut R) -> String {
        self.retry_question_template
            .replace("{seed}", &entropy_seed(rng).to_string())
            .replace("{topic}", topic)
    }

    pub fn avoid_repeat_prompt(&self, question: &str, previous: &[String]) -> String {
        let listed = previous
            .iter()
            .map(|entry| format!("- {entry}"))
            .collect::<Vec<_>>()
            .join("\n");
        self.avoid_repeat_template
            .replace("{question}", question)
            .replace("{previous}", &listed)
    }

    pub fn fallback_question<R: Rng + ?Sized>(&self, topic: &str, rng: &mut R) -> String {
        pick(&self.fallback_questions, rng).replace("{topic}", topic)
    }
}
