//! Authored filename patterns.
//!
//! Heuristics cannot answer `01 R lego pen.jpg`, so curriculum authors map
//! such filenames to fixed exchanges with regular expressions. Patterns are
//! grouped into collections (usually one per book/unit topic) and checked in
//! registration order.

use exn::{OptionExt, ResultExt};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::error::{ErrorKind, Result};
use crate::models::QuestionAnswer;

/// Category of patterns that apply to every unit.
pub const GENERIC_CATEGORY: &str = "generic";

/// What a pattern produces once its regex matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternOutput {
    /// A fixed question and answer.
    Direct { question: String, answer: String },
    /// Templates expanded with the regex captures (`$1`, `${name}`).
    Template { question: String, answer: String },
}

#[derive(Debug, Clone)]
pub struct Pattern {
    pub id: String,
    pub category: String,
    regex: Regex,
    output: PatternOutput,
}

impl Pattern {
    /// Compile a pattern. Matching is case-insensitive.
    pub fn new(id: impl Into<String>, regex: &str, category: impl Into<String>, output: PatternOutput) -> Result<Self> {
        let id = id.into();
        let regex = RegexBuilder::new(regex).case_insensitive(true).build().or_raise(|| ErrorKind::InvalidPattern {
            id: id.clone(),
            reason: format!("cannot compile {regex:?}"),
        })?;
        Ok(Self {
            id,
            category: category.into(),
            regex,
            output,
        })
    }

    pub fn direct(
        id: impl Into<String>,
        regex: &str,
        question: impl Into<String>,
        answer: impl Into<String>,
        category: impl Into<String>,
    ) -> Result<Self> {
        let output = PatternOutput::Direct {
            question: question.into(),
            answer: answer.into(),
        };
        Self::new(id, regex, category, output)
    }

    pub fn regex(&self) -> &str {
        self.regex.as_str()
    }

    pub fn output(&self) -> &PatternOutput {
        &self.output
    }

    /// Apply the pattern to `filename`.
    pub fn matches(&self, filename: &str) -> Option<QuestionAnswer> {
        let captures = self.regex.captures(filename)?;
        let (question, answer) = match &self.output {
            PatternOutput::Direct { question, answer } => (question.clone(), answer.clone()),
            PatternOutput::Template { question, answer } => {
                let mut expanded = (String::new(), String::new());
                captures.expand(question, &mut expanded.0);
                captures.expand(answer, &mut expanded.1);
                (expanded.0.trim().to_string(), expanded.1.trim().to_string())
            },
        };
        Some(
            QuestionAnswer::new(question, answer)
                .with_category(self.category.as_str())
                .with_source(self.id.as_str()),
        )
    }

    fn applies_to(&self, collection_id: &str, unit: Option<&str>) -> bool {
        let Some(unit) = unit else {
            return true;
        };
        self.category == GENERIC_CATEGORY || names_unit(&self.category, unit) || names_unit(collection_id, unit)
    }
}

/// Whether `label` mentions `unit{N}` as a whole token, so `unit1` does not
/// match `unit12-food`.
fn names_unit(label: &str, unit: &str) -> bool {
    let unit = unit.trim();
    let number = unit
        .get(..4)
        .filter(|prefix| prefix.eq_ignore_ascii_case("unit"))
        .map_or(unit, |_| &unit[4..]);
    if number.is_empty() {
        return false;
    }
    let needle = format!("unit{number}");
    label.match_indices(&needle).any(|(at, _)| {
        let before = label[..at].chars().next_back();
        let after = label[at + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[derive(Debug, Clone)]
pub struct PatternCollection {
    pub id: String,
    pub description: String,
    pub patterns: Vec<Pattern>,
}

impl PatternCollection {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            patterns: Vec::new(),
        }
    }

    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.patterns.push(pattern);
        self
    }
}

/// Registered pattern collections, searched in registration order.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    collections: Vec<PatternCollection>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collection; ids must be unique.
    pub fn add_collection(&mut self, collection: PatternCollection) -> Result<()> {
        if self.collection(&collection.id).is_some() {
            exn::bail!(ErrorKind::DuplicateCollection(collection.id));
        }
        self.collections.push(collection);
        Ok(())
    }

    /// Append a pattern to an existing collection.
    pub fn add_pattern(&mut self, collection_id: &str, pattern: Pattern) -> Result<()> {
        let collection = self
            .collections
            .iter_mut()
            .find(|collection| collection.id == collection_id)
            .ok_or_raise(|| ErrorKind::UnknownCollection(collection_id.to_string()))?;
        collection.patterns.push(pattern);
        Ok(())
    }

    pub fn collection(&self, id: &str) -> Option<&PatternCollection> {
        self.collections.iter().find(|collection| collection.id == id)
    }

    pub fn collections(&self) -> &[PatternCollection] {
        &self.collections
    }

    pub fn is_empty(&self) -> bool {
        self.collections.iter().all(|collection| collection.patterns.is_empty())
    }

    /// First pattern matching `filename`.
    ///
    /// With a `unit` (`"2"` or `"unit2"`), only generic patterns and those
    /// whose category or collection names that unit are considered.
    pub fn find_match(&self, filename: &str, unit: Option<&str>) -> Option<QuestionAnswer> {
        self.collections.iter().find_map(|collection| {
            collection
                .patterns
                .iter()
                .filter(|pattern| pattern.applies_to(&collection.id, unit))
                .find_map(|pattern| pattern.matches(filename))
        })
    }

    /// Patterns whose category is `unit_or_category`, or which belong to that
    /// unit by category prefix or collection id.
    pub fn patterns_for(&self, unit_or_category: &str) -> Vec<&Pattern> {
        let prefix = format!("unit{unit_or_category}-");
        self.collections
            .iter()
            .flat_map(|collection| {
                let whole = names_unit(&collection.id, unit_or_category);
                let prefix = prefix.as_str();
                collection.patterns.iter().filter(move |pattern| {
                    whole || pattern.category == unit_or_category || pattern.category.starts_with(&prefix)
                })
            })
            .collect()
    }

    /// Parse collections from their JSON definition:
    ///
    /// ```json
    /// [{ "id": "book1-unit2-pens", "description": "...", "patterns": [
    ///     { "id": "lego-pen", "regex": "lego.+pen", "category": "school-objects",
    ///       "question": "Do you have a Lego pen?", "answer": "Yes, I have a Lego pen." }
    /// ]}]
    /// ```
    ///
    /// Template patterns use `questionTemplate` / `answerTemplate` instead.
    pub fn from_json(json: &str) -> Result<Self> {
        let definitions: Vec<CollectionDefinition> =
            serde_json::from_str(json).or_raise(|| ErrorKind::MalformedDefinitions)?;
        let mut set = Self::new();
        for definition in definitions {
            let mut collection = PatternCollection::new(definition.id, definition.description);
            for pattern in definition.patterns {
                collection.patterns.push(pattern.compile()?);
            }
            set.add_collection(collection)?;
        }
        tracing::debug!(collections = set.collections.len(), "Loaded pattern definitions");
        Ok(set)
    }
}

#[derive(Debug, Deserialize)]
struct CollectionDefinition {
    id: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    patterns: Vec<PatternDefinition>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatternDefinition {
    id: String,
    regex: String,
    #[serde(default = "generic")]
    category: String,
    question: Option<String>,
    answer: Option<String>,
    question_template: Option<String>,
    answer_template: Option<String>,
}

fn generic() -> String {
    GENERIC_CATEGORY.to_string()
}

impl PatternDefinition {
    fn compile(self) -> Result<Pattern> {
        let output = match (self.question, self.answer, self.question_template, self.answer_template) {
            (Some(question), Some(answer), _, _) => PatternOutput::Direct { question, answer },
            (_, _, Some(question), Some(answer)) => PatternOutput::Template { question, answer },
            _ => exn::bail!(ErrorKind::IncompletePattern(self.id)),
        };
        Pattern::new(self.id, &self.regex, self.category, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn school_objects() -> PatternSet {
        let mut set = PatternSet::new();
        set.add_collection(
            PatternCollection::new("book1-unit2-school-objects", "School objects")
                .with_pattern(
                    Pattern::direct(
                        "lego-pen",
                        r"lego.+pen|pen.*lego",
                        "Do you have a Lego pen?",
                        "Yes, I have a Lego pen.",
                        "school-objects",
                    )
                    .unwrap(),
                )
                .with_pattern(
                    Pattern::direct("sharpener", r"what\s*is\s*it.+sharpener", "What is it?", "It is a sharpener.", "unit2-objects")
                        .unwrap(),
                ),
        )
        .unwrap();
        set.add_collection(
            PatternCollection::new("shared", "Everywhere").with_pattern(
                Pattern::direct("lego-anything", r"lego", "Is it Lego?", "Yes, it is.", GENERIC_CATEGORY).unwrap(),
            ),
        )
        .unwrap();
        set
    }

    #[rstest]
    #[case("01 R Lego PEN.jpg", None, Some("lego-pen"))]
    #[case("01 R Lego PEN.jpg", Some("2"), Some("lego-pen"))]
    #[case("01 R Lego PEN.jpg", Some("unit2"), Some("lego-pen"))]
    #[case("01 R Lego PEN.jpg", Some("12"), Some("lego-anything"))]
    #[case("What is it – a sharpener", Some("12"), None)]
    #[case("What is it – a sharpener", Some("2"), Some("sharpener"))]
    #[case("a red apple", None, None)]
    fn test_find_match(#[case] filename: &str, #[case] unit: Option<&str>, #[case] source: Option<&str>) {
        let found = school_objects().find_match(filename, unit);
        assert_eq!(found.as_ref().and_then(|qa| qa.source.as_deref()), source);
    }

    #[test]
    fn test_direct_match_fields() {
        let qa = school_objects().find_match("pen made of lego", Some("2")).unwrap();
        assert_eq!(qa.question, "Do you have a Lego pen?");
        assert_eq!(qa.answer, "Yes, I have a Lego pen.");
        assert_eq!(qa.category.as_deref(), Some("school-objects"));
    }

    #[rstest]
    #[case("unit2-objects", "2", true)]
    #[case("book1-unit2-school-objects", "unit2", true)]
    #[case("book1-unit12-food", "1", false)]
    #[case("book1-unit12-food", "12", true)]
    #[case("unit2", "", false)]
    fn test_names_unit(#[case] label: &str, #[case] unit: &str, #[case] expected: bool) {
        assert_eq!(names_unit(label, unit), expected);
    }

    #[test]
    fn test_template_pattern() {
        let pattern = Pattern::new(
            "where-from",
            r"where\s+is\s+(?P<who>he|she)\s+from\s*[–—]\s*(?P<place>.+)$",
            "countries",
            PatternOutput::Template {
                question: "Where is ${who} from?".into(),
                answer: "${who} is from ${place}.".into(),
            },
        )
        .unwrap();
        let qa = pattern.matches("Where is she from – Brazil").unwrap();
        assert_eq!(qa.question, "Where is she from?");
        assert_eq!(qa.answer, "she is from Brazil.");
        assert_eq!(qa.source.as_deref(), Some("where-from"));
    }

    #[test]
    fn test_collection_management() {
        let mut set = school_objects();
        let err = set.add_collection(PatternCollection::new("shared", "again")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::DuplicateCollection(_)));

        let err = set
            .add_pattern("missing", Pattern::direct("x", "x", "Q?", "A.", GENERIC_CATEGORY).unwrap())
            .unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnknownCollection(_)));

        set.add_pattern("shared", Pattern::direct("x", "xylophone", "Q?", "A.", GENERIC_CATEGORY).unwrap()).unwrap();
        assert_eq!(set.collection("shared").unwrap().patterns.len(), 2);
        assert_eq!(set.patterns_for("2").len(), 2);
        assert_eq!(set.patterns_for("school-objects").len(), 1);
    }

    #[test]
    fn test_invalid_regex() {
        let err = Pattern::direct("broken", r"(unclosed", "Q?", "A.", GENERIC_CATEGORY).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPattern { id, .. } if id == "broken"));
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"id": "book2-unit5-animals", "description": "Animals", "patterns": [
                {"id": "tiger", "regex": "tiger", "question": "What is it?", "answer": "It is a tiger.", "category": "animals"},
                {"id": "colour", "regex": "(red|blue) (\\w+)", "questionTemplate": "What colour is the $2?", "answerTemplate": "It is $1."}
            ]}
        ]"#;
        let set = PatternSet::from_json(json).unwrap();
        assert!(!set.is_empty());
        assert_eq!(set.find_match("a TIGER", Some("5")).unwrap().answer, "It is a tiger.");
        let qa = set.find_match("red car", Some("9")).unwrap();
        assert_eq!(qa.question, "What colour is the car?");
        assert_eq!(qa.category.as_deref(), Some(GENERIC_CATEGORY));
    }

    #[rstest]
    #[case(r#"[{"id": "c", "patterns": [{"id": "p", "regex": "x", "question": "Q?"}]}]"#)]
    #[case(r#"{"id": "c"}"#)]
    #[case(r#"[{"id": "c"}, {"id": "c"}]"#)]
    fn test_from_json_rejects(#[case] json: &str) {
        assert!(PatternSet::from_json(json).is_err());
    }
}
