use serde::{Deserialize, Serialize};

/// Structured plan attached to a `lesson` resource.
///
/// Stage fields hold free-form teacher notes; any of them may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LessonPlan {
    pub objectives: Vec<String>,
    pub warm_up: String,
    pub presentation: String,
    pub practice: String,
    pub production: String,
    pub assessment: String,
    pub materials: Vec<String>,
    pub vocabulary: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<String>,
}
