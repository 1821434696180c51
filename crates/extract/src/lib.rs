//! Question/answer extraction for curriculum assets.
//!
//! Every image in a unit illustrates a short exchange ("Where is she from?"
//! / "It is from Spain."). When no authored mapping exists the exchange is
//! recovered from the asset's filename, and teachers can paste whole lists of
//! exchanges as plain text.
//!
//! - [`extract_from_filename`] / [`FilenameExtractor`]: filename heuristics
//!   with pluggable [`AnswerRule`]s.
//! - [`extract_from_text`]: bulk extraction from pasted text.
//! - [`PatternSet`]: authored regex patterns, checked before the heuristics
//!   by [`QaResolver`].
//!
//! Extraction is pure: no I/O, nothing persisted.

mod consts;
pub mod error;
mod filename;
mod models;
mod patterns;
mod resolver;
mod text;

pub use crate::filename::{
    AnswerRule, FilenameExtractor, Fragments, NationalityRule, OriginRule, WhatRule, extract_from_filename,
};
pub use crate::models::QuestionAnswer;
pub use crate::patterns::{GENERIC_CATEGORY, Pattern, PatternCollection, PatternOutput, PatternSet};
pub use crate::resolver::QaResolver;
pub use crate::text::extract_from_text;
