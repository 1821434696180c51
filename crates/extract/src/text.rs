use crate::consts::{ANSWER_PREFIX_REGEX, QUESTION_PREFIX_REGEX};
use crate::models::QuestionAnswer;

/// Extract question/answer pairs from freeform pasted text.
///
/// Blank lines are ignored. Each remaining line is tried against these
/// conventions in order, and lines consumed by a match are not reconsidered:
///
/// 1. an ALL-CAPS line without `?` starts a new category;
/// 2. a `Q:` line immediately followed by an `A:` line;
/// 3. a single `question → answer` line;
/// 4. a line containing `?` followed by a line without one.
///
/// Anything else is skipped.
///
/// # Examples
///
/// ```
/// use vela_extract::extract_from_text;
///
/// let pairs = extract_from_text("COUNTRIES\nQ: What country is this?\nA: It is Spain.");
/// assert_eq!(pairs.len(), 1);
/// assert_eq!(pairs[0].category.as_deref(), Some("COUNTRIES"));
/// assert_eq!(pairs[0].answer, "It is Spain.");
/// ```
pub fn extract_from_text(text: &str) -> Vec<QuestionAnswer> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|line| !line.is_empty()).collect();
    let mut pairs = Vec::new();
    let mut category = String::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let next = lines.get(i + 1).copied();
        i += 1;

        if is_header(line) {
            category = line.to_string();
            continue;
        }

        let pair = if let (Some(question), Some(answer)) = (
            QUESTION_PREFIX_REGEX.find(line).map(|m| &line[m.end()..]),
            next.and_then(|next| ANSWER_PREFIX_REGEX.find(next).map(|m| &next[m.end()..])),
        ) {
            i += 1;
            (question, answer)
        } else if let Some((question, answer)) = line.split_once('→') {
            (question, answer.split('→').next().unwrap_or(answer))
        } else if let Some(answer) = next.filter(|next| line.contains('?') && !next.contains('?')) {
            i += 1;
            (line, answer)
        } else {
            continue;
        };

        let (question, answer) = (pair.0.trim(), pair.1.trim());
        if question.is_empty() || answer.is_empty() {
            continue;
        }
        pairs.push(QuestionAnswer::new(question, answer).with_category(category.as_str()));
    }

    tracing::debug!(lines = lines.len(), pairs = pairs.len(), "Extracted pairs from text");
    pairs
}

fn is_header(line: &str) -> bool {
    !line.contains('?') && line.chars().any(char::is_alphabetic) && line == line.to_uppercase()
}
