mod key;
mod lesson;
mod resource;

pub use self::key::UnitKey;
pub use self::lesson::LessonPlan;
pub use self::resource::{Location, ResourceType, TeacherResource};

fn sanitize(s: impl AsRef<str>) -> String {
    s.as_ref().trim().to_lowercase().replace(['-', '_', ' '], "")
}
