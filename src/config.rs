use std::env;
use std::path::PathBuf;

const DEFAULT_MODEL: &str = "gpt-5";
const DEFAULT_MODEL_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 120;
const DEFAULT_HISTORY_FILE_NAME: &str = ".askgpt_history";
const DEFAULT_HISTORY_MAX_ITEMS: usize = 200;
const DEFAULT_DEDUP_WINDOW: usize = 50;
const DEFAULT_AVOID_REPEAT_SHOWN: usize = 5;
const DEFAULT_BATCH_COUNT: u32 = 5;
const DEFAULT_BATCH_TOKEN_MULTIPLIER: u32 = 4;

pub const DEFAULT_CANNED_PHRASES: &[&str] = &[
    "how can i help you",
    "how may i help",
    "how can i assist",
    "what can i do for you",
    "i'm here to help",
];

/// How a model without temperature support is asked for several distinct questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStrategy {
    /// Ask in the prompt for N distinct lines in a single completion.
    Prompt,
    /// Ask the provider for N completions through its `n` parameter.
    Choices,
}

impl BatchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Choices => "choices",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub history_max_items: usize,
    pub dedup_window: usize,
    pub avoid_repeat_shown: usize,
    pub batch_count: u32,
    pub batch_token_multiplier: u32,
    pub batch_strategy: BatchStrategy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            history_max_items: DEFAULT_HISTORY_MAX_ITEMS,
            dedup_window: DEFAULT_DEDUP_WINDOW,
            avoid_repeat_shown: DEFAULT_AVOID_REPEAT_SHOWN,
            batch_count: DEFAULT_BATCH_COUNT,
            batch_token_multiplier: DEFAULT_BATCH_TOKEN_MULTIPLIER,
            batch_strategy: BatchStrategy::Prompt,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub model_base_url: String,
    pub model_timeout_secs: u64,
    pub history_file: Option<PathBuf>,
    pub canned_phrases: Vec<String>,
    pub pipeline: PipelineSettings,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        let api_key = get_var("OPENAI_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        let model_base_url =
            get_var("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_MODEL_BASE_URL.to_string());
        let model_timeout_secs = parse_model_timeout_secs(get_var("MODEL_TIMEOUT_SECS").as_deref());
        let history_file = get_var("ASKGPT_HISTORY_FILE")
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);
        let canned_phrases = parse_canned_phrases(get_var("CANNED_PHRASES").as_deref());

        let pipeline = PipelineSettings {
            history_max_items: parse_positive_usize(
                get_var("HISTORY_MAX_ITEMS").as_deref(),
                DEFAULT_HISTORY_MAX_ITEMS,
            ),
            dedup_window: parse_positive_usize(
                get_var("HISTORY_DEDUP_WINDOW").as_deref(),
                DEFAULT_DEDUP_WINDOW,
            ),
            avoid_repeat_shown: parse_positive_usize(
                get_var("AVOID_REPEAT_SHOWN").as_deref(),
                DEFAULT_AVOID_REPEAT_SHOWN,
            ),
            batch_count: parse_positive_u32(get_var("BATCH_COUNT").as_deref(), DEFAULT_BATCH_COUNT),
            batch_token_multiplier: parse_positive_u32(
                get_var("BATCH_TOKEN_MULTIPLIER").as_deref(),
                DEFAULT_BATCH_TOKEN_MULTIPLIER,
            ),
            batch_strategy: parse_batch_strategy(get_var("BATCH_STRATEGY").as_deref()),
        };

        Self {
            api_key,
            model: get_var("MODEL")
                .map(|model| model.trim().to_string())
                .filter(|model| !model.is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            model_base_url,
            model_timeout_secs,
            history_file,
            canned_phrases,
            pipeline,
        }
    }

    /// Location of the answer history, `~/.askgpt_history` unless overridden.
    pub fn history_path(&self) -> PathBuf {
        if let Some(path) = &self.history_file {
            return path.clone();
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_HISTORY_FILE_NAME)
    }
}

fn parse_positive_u64(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_positive_u32(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_positive_usize(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_model_timeout_secs(raw: Option<&str>) -> u64 {
    parse_positive_u64(raw, DEFAULT_MODEL_TIMEOUT_SECS)
}

fn parse_batch_strategy(raw: Option<&str>) -> BatchStrategy {
    match raw.unwrap_or("prompt").trim().to_ascii_lowercase().as_str() {
        "choices" | "n" => BatchStrategy::Choices,
        _ => BatchStrategy::Prompt,
    }
}

fn parse_canned_phrases(raw: Option<&str>) -> Vec<String> {
    let custom: Vec<String> = raw
        .unwrap_or_default()
        .split('|')
        .map(|phrase| phrase.trim().to_lowercase())
        .filter(|phrase| !phrase.is_empty())
        .collect();

    if custom.is_empty() {
        DEFAULT_CANNED_PHRASES
            .iter()
            .map(|phrase| (*phrase).to_string())
            .collect()
    } else {
        custom
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::{
        BatchStrategy, Config, DEFAULT_CANNED_PHRASES, DEFAULT_MODEL, DEFAULT_MODEL_BASE_URL,
        DEFAULT_MODEL_TIMEOUT_SECS, PipelineSettings, parse_batch_strategy, parse_canned_phrases,
        parse_model_timeout_secs, parse_positive_usize,
    };

    fn config_from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        Config::from_env_with(|key| vars.get(key).cloned())
    }

    #[test]
    fn from_env_uses_defaults_when_vars_are_missing() {
        let cfg = config_from_pairs(&[]);
        assert_eq!(cfg.api_key, None);
        assert_eq!(cfg.model, DEFAULT_MODEL);
        assert_eq!(cfg.model_base_url, DEFAULT_MODEL_BASE_URL);
        assert_eq!(cfg.model_timeout_secs, DEFAULT_MODEL_TIMEOUT_SECS);
        assert_eq!(cfg.history_file, None);
        assert_eq!(cfg.canned_phrases.len(), DEFAULT_CANNED_PHRASES.len());
        assert_eq!(cfg.pipeline, PipelineSettings::default());
    }

    #[test]
    fn from_env_reads_configured_values() {
        let cfg = config_from_pairs(&[
            ("OPENAI_API_KEY", " sk-test "),
            ("MODEL", "gpt-3.5-turbo"),
            ("OPENAI_BASE_URL", "http://localhost:9999/v1"),
            ("MODEL_TIMEOUT_SECS", "15"),
            ("ASKGPT_HISTORY_FILE", "/tmp/history.txt"),
            ("HISTORY_MAX_ITEMS", "10"),
            ("HISTORY_DEDUP_WINDOW", "4"),
            ("AVOID_REPEAT_SHOWN", "2"),
            ("BATCH_COUNT", "3"),
            ("BATCH_TOKEN_MULTIPLIER", "6"),
            ("BATCH_STRATEGY", "choices"),
            ("CANNED_PHRASES", "As an AI | hello there"),
        ]);

        assert_eq!(cfg.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.model, "gpt-3.5-turbo");
        assert_eq!(cfg.model_base_url, "http://localhost:9999/v1");
        assert_eq!(cfg.model_timeout_secs, 15);
        assert_eq!(cfg.history_path(), PathBuf::from("/tmp/history.txt"));
        assert_eq!(cfg.canned_phrases, vec!["as an ai", "hello there"]);
        assert_eq!(
            cfg.pipeline,
            PipelineSettings {
                history_max_items: 10,
                dedup_window: 4,
                avoid_repeat_shown: 2,
                batch_count: 3,
                batch_token_multiplier: 6,
                batch_strategy: BatchStrategy::Choices,
            }
        );
    }

    #[test]
    fn from_env_treats_blank_api_key_as_missing() {
        let cfg = config_from_pairs(&[("OPENAI_API_KEY", "   ")]);
        assert_eq!(cfg.api_key, None);
    }

    #[test]
    fn history_path_defaults_to_hidden_file_name() {
        let cfg = config_from_pairs(&[]);
        assert!(cfg.history_path().ends_with(".askgpt_history"));
    }

    #[test]
    fn parse_model_timeout_secs_uses_default_for_missing_or_invalid_values() {
        assert_eq!(parse_model_timeout_secs(None), DEFAULT_MODEL_TIMEOUT_SECS);
        assert_eq!(
            parse_model_timeout_secs(Some("not-a-number")),
            DEFAULT_MODEL_TIMEOUT_SECS
        );
        assert_eq!(
            parse_model_timeout_secs(Some("0")),
            DEFAULT_MODEL_TIMEOUT_SECS
        );
        assert_eq!(parse_model_timeout_secs(Some("  90  ")), 90);
    }

    #[test]
    fn parse_positive_usize_rejects_zero_and_garbage() {
        assert_eq!(parse_positive_usize(Some("0"), 7), 7);
        assert_eq!(parse_positive_usize(Some("-3"), 7), 7);
        assert_eq!(parse_positive_usize(Some("12"), 7), 12);
    }

    #[test]
    fn parse_batch_strategy_defaults_to_prompt() {
        assert_eq!(parse_batch_strategy(None), BatchStrategy::Prompt);
        assert_eq!(parse_batch_strategy(Some("unknown")), BatchStrategy::Prompt);
        assert_eq!(parse_batch_strategy(Some(" CHOICES ")), BatchStrategy::Choices);
    }

    #[test]
    fn parse_canned_phrases_falls_back_to_defaults_when_empty() {
        assert_eq!(parse_canned_phrases(Some(" | ")).len(), DEFAULT_CANNED_PHRASES.len());
        assert_eq!(parse_canned_phrases(None)[0], "how can i help you");
    }
}
