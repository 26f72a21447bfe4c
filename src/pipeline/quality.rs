use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::DEFAULT_CANNED_PHRASES;
use crate::history::normalize_entry;

/// Predicate flagging generic assistant boilerplate.
pub trait LowQualityCheck {
    fn is_low_quality(&self, text: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseBlocklist {
    phrases: Vec<String>,
}

impl PhraseBlocklist {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|phrase| phrase.as_ref().trim().to_lowercase())
                .filter(|phrase| !phrase.is_empty())
                .collect(),
        }
    }
}

impl Default for PhraseBlocklist {
    fn default() -> Self {
        Self::new(DEFAULT_CANNED_PHRASES)
    }
}

impl LowQualityCheck for PhraseBlocklist {
    fn is_low_quality(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.phrases
            .iter()
            .any(|phrase| lowered.contains(phrase.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Acceptable,
    Empty,
    Canned,
    Duplicate,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Acceptable => "acceptable",
            Self::Empty => "empty",
            Self::Canned => "canned",
            Self::Duplicate => "duplicate",
        }
    }
}

pub struct ResponseQualityFilter {
    check: Box<dyn LowQualityCheck>,
}

impl Default for ResponseQualityFilter {
    fn default() -> Self {
        Self::new(Box::new(PhraseBlocklist::default()))
    }
}

impl ResponseQualityFilter {
    pub fn new(check: Box<dyn LowQualityCheck>) -> Self {
        Self { check }
    }

    /// `recent` is the window of history to compare against.
    pub fn classify(&self, text: &str, recent: &[String]) -> Verdict {
        if text.trim().is_empty() {
            Verdict::Empty
        } else if self.check.is_low_quality(text) {
            Verdict::Canned
        } else if is_duplicate(text, recent) {
            Verdict::Duplicate
        } else {
            Verdict::Acceptable
        }
    }
}

pub fn is_duplicate(text: &str, recent: &[String]) -> bool {
    let candidate = normalize_entry(text);
    !candidate.is_empty()
        && recent
            .iter()
            .any(|entry| normalize_entry(entry) == candidate)
}

/// Drops a leading list marker (`1.`, `2)`, `3 -`, `-`, `*`) but keeps
/// questions that merely start with a number.
fn strip_enumeration(line: &str) -> &str {
    let line = line.trim();
    let after_digits = line.trim_start_matches(|c: char| c.is_ascii_digit());
    let unnumbered = if after_digits.len() < line.len() {
        let marked = after_digits.trim_start();
        match marked.strip_prefix(['.', ')', '-', ':']) {
            Some(rest) => rest,
            None => line,
        }
    } else {
        line
    };
    unnumbered
        .trim_start_matches(|c: char| matches!(c, '-' | '*' | '•' | '.' | ')') || c.is_whitespace())
        .trim_end()
}

/// Splits batched model output into distinct questions, in order.
pub fn parse_question_lines(text: &str) -> Vec<String> {
    let mut questions: Vec<String> = Vec::new();
    for line in text.lines() {
        let question = strip_enumeration(line);
        if question.is_empty() || questions.iter().any(|seen| seen == question) {
            continue;
        }
        questions.push(question.to_string());
    }
    questions
}

/// Uniform pick among parsed questions, else the first raw non-empty line.
pub fn pick_question<R: Rng + ?Sized>(text: &str, rng: &mut R) -> String {
    let questions = parse_question_lines(text);
    if let Some(question) = questions.choose(rng) {
        return question.clone();
    }
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::{
        LowQualityCheck, PhraseBlocklist, ResponseQualityFilter, Verdict, parse_question_lines,
        pick_question,
    };

    fn history(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|entry| (*entry).to_string()).collect()
    }

    #[test]
    fn canned_detection_ignores_case() {
        let filter = ResponseQualityFilter::default();
        assert_eq!(filter.classify("How can I help you today?", &[]), Verdict::Canned);
        assert_eq!(filter.classify("HOW MAY I HELP?", &[]), Verdict::Canned);
        assert_eq!(filter.classify("Sure! I'm here to help.", &[]), Verdict::Canned);
    }

    #[test]
    fn blank_text_is_empty() {
        let filter = ResponseQualityFilter::default();
        assert_eq!(filter.classify("", &[]), Verdict::Empty);
        assert_eq!(filter.classify(" \n\t", &[]), Verdict::Empty);
    }

    #[test]
    fn exact_match_against_recent_history_is_duplicate() {
        let filter = ResponseQualityFilter::default();
        let recent = history(&["Paris.", "Blue."]);
        assert_eq!(filter.classify("Paris.", &recent), Verdict::Duplicate);
        assert_eq!(filter.classify("paris.", &recent), Verdict::Acceptable);
        assert_eq!(filter.classify("Paris.", &[]), Verdict::Acceptable);
    }

    #[test]
    fn multi_line_answer_matches_its_flattened_history_entry() {
        let filter = ResponseQualityFilter::default();
        let recent = history(&["Line one. Line two."]);
        assert_eq!(
            filter.classify("Line one.\nLine two.", &recent),
            Verdict::Duplicate
        );
    }

    #[test]
    fn custom_check_replaces_blocklist() {
        struct TooShort;
        impl LowQualityCheck for TooShort {
            fn is_low_quality(&self, text: &str) -> bool {
                text.trim().len() < 4
            }
        }

        let filter = ResponseQualityFilter::new(Box::new(TooShort));
        assert_eq!(filter.classify("ok", &[]), Verdict::Canned);
        assert_eq!(filter.classify("How can I help you?", &[]), Verdict::Acceptable);
    }

    #[test]
    fn blocklist_from_custom_phrases() {
        let check = PhraseBlocklist::new([" As An AI ", ""]);
        assert!(check.is_low_quality("As an AI language model, I cannot"));
        assert!(!check.is_low_quality("How can I help you?"));
    }

    #[test]
    fn parse_strips_enumeration_and_dedups_in_order() {
        assert_eq!(
            parse_question_lines("1. Foo?\n2. Foo?\n3. Bar?"),
            vec!["Foo?".to_string(), "Bar?".to_string()]
        );
        assert_eq!(
            parse_question_lines("- Why?\n\n  * How?  \n10) Why?"),
            vec!["Why?".to_string(), "How?".to_string()]
        );
    }

    #[test]
    fn parse_keeps_leading_numbers_that_are_not_markers() {
        assert_eq!(
            parse_question_lines("1. 3D printers at home?\n2) 24 hours in Rome?\n100 years ago?"),
            vec![
                "3D printers at home?".to_string(),
                "24 hours in Rome?".to_string(),
                "100 years ago?".to_string(),
            ]
        );
    }

    #[test]
    fn pick_question_chooses_among_parsed_lines() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            let picked = pick_question("1. Foo?\n2. Foo?\n3. Bar?", &mut rng);
            assert!(picked == "Foo?" || picked == "Bar?", "picked {picked}");
        }
    }

    #[test]
    fn pick_question_falls_back_to_first_raw_line() {
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(pick_question("\n 1. \n--\n", &mut rng), "1.");
        assert_eq!(pick_question("  \n", &mut rng), "");
    }
}
