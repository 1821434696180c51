use tracing::instrument;

use crate::filename::FilenameExtractor;
use crate::models::QuestionAnswer;
use crate::patterns::PatternSet;

/// Authored patterns first, filename heuristics second.
#[derive(Debug, Default)]
pub struct QaResolver {
    patterns: PatternSet,
    extractor: FilenameExtractor,
}

impl QaResolver {
    pub fn new(patterns: PatternSet, extractor: FilenameExtractor) -> Self {
        Self { patterns, extractor }
    }

    pub fn with_patterns(patterns: PatternSet) -> Self {
        Self::new(patterns, FilenameExtractor::default())
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Question/answer pair for an asset, or `None` when neither an authored
    /// pattern nor the heuristics recognise the filename. Callers then show
    /// the filename as-is or omit the overlay.
    #[instrument(level = "debug", skip(self))]
    pub fn resolve(&self, filename: &str, unit: Option<&str>) -> Option<QuestionAnswer> {
        if let Some(qa) = self.patterns.find_match(filename, unit) {
            return Some(qa);
        }
        let qa = self.extractor.extract(filename);
        if qa.is_none() {
            tracing::debug!("No question/answer recognised");
        }
        qa
    }
}
