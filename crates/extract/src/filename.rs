//! Question/answer recovery from asset filenames.
//!
//! Curriculum images are named after the exchange they illustrate, e.g.
//! `01 R Where is she from – Spain.jpg`. [`FilenameExtractor`] strips the
//! extension and the asset code, splits on the dash and lets a list of
//! [`AnswerRule`]s turn the bare answer fragment into a full sentence.

use std::sync::LazyLock;

use tracing::instrument;

use crate::consts::{
    CATEGORY_REGEX, CODE_PREFIX_REGEX, CODE_SECOND_LETTER_REGEX, DASHES, IMAGE_EXTENSION_REGEX, YES_NO_ANSWER,
};
use crate::models::QuestionAnswer;

/// A filename split around its dash, handed to each [`AnswerRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragments<'a> {
    /// Question half, always ending in `?`.
    pub question: &'a str,
    /// Answer half, trimmed.
    pub answer: &'a str,
    /// Text after a second dash, if any (`country – nationality`).
    pub detail: Option<&'a str>,
    /// ALL-CAPS label found before the question.
    pub category: Option<&'a str>,
}

/// Rewrites a split filename into a question/answer pair.
///
/// Rules run in order and the first one returning `Some` wins. When none
/// apply, the halves are returned verbatim.
pub trait AnswerRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, fragments: &Fragments<'_>) -> Option<QuestionAnswer>;
}

/// "What is his nationality – French" → "He/She is French."
#[derive(Debug, Clone, Copy, Default)]
pub struct NationalityRule;

impl AnswerRule for NationalityRule {
    fn name(&self) -> &'static str {
        "nationality"
    }

    fn apply(&self, fragments: &Fragments<'_>) -> Option<QuestionAnswer> {
        if !fragments.question.to_lowercase().contains("nationality") {
            return None;
        }
        let nationality = fragments.detail.unwrap_or(fragments.answer);
        Some(
            QuestionAnswer::new("What is his/her nationality?", format!("He/She is {}.", bare(nationality)))
                .with_category("NATIONALITY"),
        )
    }
}

/// "Where are you from – France" → "It is from France."
#[derive(Debug, Clone, Copy, Default)]
pub struct OriginRule;

impl AnswerRule for OriginRule {
    fn name(&self) -> &'static str {
        "origin"
    }

    fn apply(&self, fragments: &Fragments<'_>) -> Option<QuestionAnswer> {
        let question = fragments.question.to_lowercase();
        if !has_word(&question, "from") || is_sentence(fragments.answer, &["it is", "he is", "she is"]) {
            return None;
        }
        Some(
            QuestionAnswer::new(fragments.question, format!("It is from {}.", bare(fragments.answer)))
                .with_category(fragments.category.unwrap_or("COUNTRY")),
        )
    }
}

/// "What do you eat – bread" → "It is bread."
#[derive(Debug, Clone, Copy, Default)]
pub struct WhatRule;

impl AnswerRule for WhatRule {
    fn name(&self) -> &'static str {
        "what"
    }

    fn apply(&self, fragments: &Fragments<'_>) -> Option<QuestionAnswer> {
        let question = fragments.question.to_lowercase();
        if !question.starts_with("what") || is_sentence(fragments.answer, &["it is"]) {
            return None;
        }
        Some(
            QuestionAnswer::new(fragments.question, format!("It is {}.", bare(fragments.answer)))
                .with_category(fragments.category.unwrap_or("OBJECT")),
        )
    }
}

fn bare(fragment: &str) -> &str {
    fragment.trim().trim_end_matches('.').trim_end()
}

fn is_sentence(answer: &str, openers: &[&str]) -> bool {
    let answer = answer.to_lowercase();
    openers.iter().any(|opener| answer.starts_with(opener))
}

fn has_word(haystack: &str, word: &str) -> bool {
    haystack.split(|c: char| !c.is_alphanumeric()).any(|w| w == word)
}

/// Filename heuristics with a pluggable rule list.
pub struct FilenameExtractor {
    rules: Vec<Box<dyn AnswerRule>>,
}

impl Default for FilenameExtractor {
    /// Nationality, origin and "what" rules, in that order.
    fn default() -> Self {
        Self::with_rules(vec![Box::new(NationalityRule), Box::new(OriginRule), Box::new(WhatRule)])
    }
}

impl std::fmt::Debug for FilenameExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.rules.iter().map(|rule| rule.name()).collect();
        f.debug_struct("FilenameExtractor").field("rules", &names).finish()
    }
}

impl FilenameExtractor {
    pub fn with_rules(rules: Vec<Box<dyn AnswerRule>>) -> Self {
        Self { rules }
    }

    /// Append a rule, consulted after the existing ones.
    pub fn push_rule(&mut self, rule: impl AnswerRule + 'static) {
        self.rules.push(Box::new(rule));
    }

    /// Recover a question/answer pair from a display filename.
    ///
    /// Any directory part is ignored. Returns `None` when the name holds
    /// neither a dash-separated pair nor a trailing `?`.
    #[instrument(level = "trace", skip(self))]
    pub fn extract(&self, filename: &str) -> Option<QuestionAnswer> {
        let cleaned = clean(filename);
        let (category, body) = split_category(&cleaned);

        let Some((question, rest)) = body.split_once(DASHES) else {
            return body
                .ends_with('?')
                .then(|| QuestionAnswer::new(body, YES_NO_ANSWER).with_category(category.unwrap_or_default()));
        };
        let (answer, detail) = match rest.split_once(DASHES) {
            Some((answer, detail)) => (answer.trim(), Some(detail.trim()).filter(|d| !d.is_empty())),
            None => (rest.trim(), None),
        };
        let question = question.trim();
        if question.is_empty() || answer.is_empty() {
            return None;
        }
        let question = if question.ends_with('?') {
            question.to_string()
        } else {
            format!("{question}?")
        };

        let fragments = Fragments {
            question: &question,
            answer,
            detail,
            category,
        };
        for rule in &self.rules {
            if let Some(qa) = rule.apply(&fragments) {
                tracing::trace!(rule = rule.name(), "Answer rule matched");
                return Some(qa);
            }
        }
        Some(QuestionAnswer::new(question.as_str(), answer).with_category(category.unwrap_or_default()))
    }
}

static DEFAULT_EXTRACTOR: LazyLock<FilenameExtractor> = LazyLock::new(FilenameExtractor::default);

/// [`FilenameExtractor::extract`] with the default rules.
///
/// # Examples
///
/// ```
/// use vela_extract::extract_from_filename;
///
/// let qa = extract_from_filename("02 I E What do you eat – bread.jpg").unwrap();
/// assert_eq!(qa.question, "What do you eat?");
/// assert_eq!(qa.answer, "It is bread.");
/// assert!(extract_from_filename("cover.png").is_none());
/// ```
pub fn extract_from_filename(filename: &str) -> Option<QuestionAnswer> {
    DEFAULT_EXTRACTOR.extract(filename)
}

fn clean(filename: &str) -> String {
    let name = filename.rsplit('/').next().unwrap_or(filename).trim();
    let name = IMAGE_EXTENSION_REGEX.replace(name, "");
    strip_code(name.trim()).trim().to_string()
}

/// Drop a leading asset code. A second code letter is only taken when a
/// capitalised word follows it: `02 I E What …` loses `I E`, while
/// `05 A I like …` keeps the pronoun.
fn strip_code(name: &str) -> &str {
    let Some(code) = CODE_PREFIX_REGEX.find(name) else {
        return name;
    };
    let rest = &name[code.end()..];
    match CODE_SECOND_LETTER_REGEX.find(rest) {
        Some(letter) if rest[letter.end()..].starts_with(|c: char| c.is_uppercase()) => &rest[letter.end()..],
        _ => rest,
    }
}

/// Split off a leading ALL-CAPS label. The label is only removed from the
/// body when a question follows it; otherwise it is kept as the category
/// and the body is left untouched.
fn split_category(text: &str) -> (Option<&str>, &str) {
    let Some(captures) = CATEGORY_REGEX.captures(text) else {
        return (None, text);
    };
    let (Some(label), Some(rest)) = (captures.get(1), captures.get(2)) else {
        return (None, text);
    };
    let rest = rest.as_str().trim();
    if rest.contains(DASHES) || rest.ends_with('?') {
        (Some(label.as_str()), rest)
    } else {
        (Some(label.as_str()), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("02 I E What do you eat – bread", "What do you eat?", "It is bread.", Some("OBJECT"))]
    #[case("03 A Where are you from – France", "Where are you from?", "It is from France.", Some("COUNTRY"))]
    #[case("01 R What is it – a pen.jpg", "What is it?", "It is a pen.", Some("OBJECT"))]
    #[case("What is it? – It is a sharpener.PNG", "What is it?", "It is a sharpener.", None)]
    #[case("12M Where is she from – She is from Italy", "Where is she from?", "She is from Italy", None)]
    #[case("04 B Is it big – Yes, it is", "Is it big?", "Yes, it is", None)]
    #[case("05 C What colour is it — red.webp", "What colour is it?", "It is red.", Some("OBJECT"))]
    #[case("05 A I am from – Spain.jpg", "I am from?", "It is from Spain.", Some("COUNTRY"))]
    #[case("08 I E I eat – rice", "I eat?", "rice", None)]
    fn test_dash_pairs(
        #[case] input: &str,
        #[case] question: &str,
        #[case] answer: &str,
        #[case] category: Option<&str>,
    ) {
        let qa = extract_from_filename(input).unwrap();
        assert_eq!(qa.question, question);
        assert_eq!(qa.answer, answer);
        assert_eq!(qa.category.as_deref(), category);
        assert_eq!(qa.source, None);
    }

    #[rstest]
    #[case("06 D What is his nationality – French", "He/She is French.")]
    #[case("06 D What is her nationality – Japan – Japanese.jpg", "He/She is Japanese.")]
    fn test_nationality(#[case] input: &str, #[case] answer: &str) {
        let qa = extract_from_filename(input).unwrap();
        assert_eq!(qa.question, "What is his/her nationality?");
        assert_eq!(qa.answer, answer);
        assert_eq!(qa.category.as_deref(), Some("NATIONALITY"));
    }

    #[test]
    fn test_category_label_is_kept() {
        let qa = extract_from_filename("COUNTRIES – Where is it from – Spain.jpg").unwrap();
        assert_eq!(qa.question, "Where is it from?");
        assert_eq!(qa.answer, "It is from Spain.");
        assert_eq!(qa.category.as_deref(), Some("COUNTRIES"));
    }

    #[rstest]
    #[case("07 A Is it a cat?.jpg", "Is it a cat?")]
    #[case("05 A I like apples?.jpg", "I like apples?")]
    #[case("book1/unit2/Do you like apples?.png", "Do you like apples?")]
    fn test_bare_question(#[case] input: &str, #[case] question: &str) {
        let qa = extract_from_filename(input).unwrap();
        assert_eq!(qa.question, question);
        assert_eq!(qa.answer, YES_NO_ANSWER);
    }

    #[rstest]
    #[case("01 A a red apple.jpg")]
    #[case("cover.png")]
    #[case("")]
    #[case("What is it – .jpg")]
    fn test_no_match(#[case] input: &str) {
        assert_eq!(extract_from_filename(input), None);
    }

    #[test]
    fn test_custom_rules() {
        struct Shout;
        impl AnswerRule for Shout {
            fn name(&self) -> &'static str {
                "shout"
            }
            fn apply(&self, fragments: &Fragments<'_>) -> Option<QuestionAnswer> {
                Some(QuestionAnswer::new(fragments.question, fragments.answer.to_uppercase()))
            }
        }

        let plain = FilenameExtractor::with_rules(Vec::new());
        let qa = plain.extract("What do you eat – bread").unwrap();
        assert_eq!(qa.answer, "bread");

        let mut extractor = FilenameExtractor::with_rules(vec![Box::new(NationalityRule)]);
        extractor.push_rule(Shout);
        assert_eq!(extractor.extract("What do you eat – bread").unwrap().answer, "BREAD");
        assert_eq!(extractor.extract("What is his nationality – Irish").unwrap().answer, "He/She is Irish.");
    }
}
