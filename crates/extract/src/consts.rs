use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

/// Dashes separating a question from its answer in a filename.
pub(crate) const DASHES: [char; 2] = ['–', '—'];
/// Placeholder answer for a bare yes/no question.
pub(crate) const YES_NO_ANSWER: &str = "Yes, it is. / No, it isn't.";

regex!(IMAGE_EXTENSION_REGEX, r"(?i)\.(?:jpe?g|png|gif|webp)$");
// Asset code prefix: "01 R", "12M". A second letter ("02 I E") is
// matched separately.
regex!(CODE_PREFIX_REGEX, r"^\d{1,3}\s*[A-Z]\b\s*");
regex!(CODE_SECOND_LETTER_REGEX, r"^[A-Z]\s+");
// ALL-CAPS category label before a dash: "COUNTRIES – ..." or "FOOD - ...".
regex!(CATEGORY_REGEX, r"^([A-Z][A-Z ]*[A-Z])\s*[-–—]\s*(.*)$");
regex!(QUESTION_PREFIX_REGEX, r"^Q\s*:\s*");
regex!(ANSWER_PREFIX_REGEX, r"^A\s*:\s*");
