use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, de};

use super::{LessonPlan, UnitKey, sanitize};
use crate::error::{Error, ErrorKind, Result};

/// Kind of teacher resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Video,
    Game,
    Pdf,
    #[default]
    Lesson,
}
impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Video => "video",
            ResourceType::Game => "game",
            ResourceType::Pdf => "pdf",
            ResourceType::Lesson => "lesson",
        }
    }
}
impl FromStr for ResourceType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Ok(match sanitize(s).as_str() {
            "video" | "videos" => Self::Video,
            "game" | "games" => Self::Game,
            "pdf" | "pdfs" => Self::Pdf,
            "lesson" | "lessons" | "lessonplan" => Self::Lesson,
            _ => exn::bail!(ErrorKind::UnknownResourceType(s.to_string())),
        })
    }
}
impl Display for ResourceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Where the resource's content lives. A resource has at most one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    SourceUrl(String),
    PdfUrl(String),
    /// Raw embed markup. Authored content, rendered verbatim by the UI.
    EmbedCode(String),
}
impl Location {
    pub fn as_str(&self) -> &str {
        match self {
            Location::SourceUrl(value) | Location::PdfUrl(value) | Location::EmbedCode(value) => value,
        }
    }
}

/// A supplementary item (video, game, PDF or lesson plan) attached to one
/// book/unit.
///
/// Serialized as the camelCase JSON record the unit modules carry, with the
/// location flattened into `sourceUrl`, `pdfUrl` or `embedCode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "RawResource")]
pub struct TeacherResource {
    pub id: String,
    pub book_id: String,
    pub unit_id: String,
    pub resource_type: ResourceType,
    pub title: String,
    pub description: Option<String>,
    pub provider: Option<String>,
    pub location: Option<Location>,
    pub order: Option<u32>,
    pub lesson_plan: Option<LessonPlan>,
}

impl TeacherResource {
    /// Resource for `key` with a stable id of the form
    /// `book{b}-unit{u}-{type}{index}`.
    pub fn new(key: &UnitKey, resource_type: ResourceType, index: usize, title: impl Into<String>) -> Self {
        Self {
            id: format!("{key}-{resource_type}{index}"),
            book_id: key.book().to_string(),
            unit_id: key.unit().to_string(),
            resource_type,
            title: title.into(),
            description: None,
            provider: None,
            location: None,
            order: None,
            lesson_plan: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_lesson_plan(mut self, plan: LessonPlan) -> Self {
        self.lesson_plan = Some(plan);
        self
    }

    /// Unit this resource belongs to, if its ids form a valid key.
    pub fn unit_key(&self) -> Option<UnitKey> {
        UnitKey::new(self.book_id.as_str(), self.unit_id.as_str()).ok()
    }
}

/// Wire shape of a resource record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResource {
    id: String,
    #[serde(default)]
    book_id: String,
    #[serde(default)]
    unit_id: String,
    resource_type: ResourceType,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_url: Option<String>,
    #[serde(default, alias = "fileUrl", skip_serializing_if = "Option::is_none")]
    pdf_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    embed_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lesson_plan: Option<LessonPlan>,
}

fn populated(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<RawResource> for TeacherResource {
    type Error = Error;

    fn try_from(raw: RawResource) -> Result<Self> {
        if raw.id.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidResource("empty id".to_string()));
        }
        if raw.title.trim().is_empty() {
            exn::bail!(ErrorKind::InvalidResource(format!("{}: empty title", raw.id)));
        }
        let source = populated(raw.source_url).map(Location::SourceUrl);
        let pdf = populated(raw.pdf_url).map(Location::PdfUrl);
        let embed = populated(raw.embed_code).map(Location::EmbedCode);
        let location = match raw.resource_type {
            ResourceType::Video => embed.or(source).or(pdf),
            ResourceType::Pdf => pdf.or(embed).or(source),
            ResourceType::Game | ResourceType::Lesson => source.or(embed).or(pdf),
        };
        Ok(Self {
            id: raw.id,
            book_id: raw.book_id,
            unit_id: raw.unit_id,
            resource_type: raw.resource_type,
            title: raw.title,
            description: raw.description,
            provider: raw.provider,
            location,
            order: raw.order,
            lesson_plan: raw.lesson_plan,
        })
    }
}

impl From<TeacherResource> for RawResource {
    fn from(resource: TeacherResource) -> Self {
        let mut raw = RawResource {
            id: resource.id,
            book_id: resource.book_id,
            unit_id: resource.unit_id,
            resource_type: resource.resource_type,
            title: resource.title,
            description: resource.description,
            provider: resource.provider,
            order: resource.order,
            lesson_plan: resource.lesson_plan,
            ..Default::default()
        };
        match resource.location {
            Some(Location::SourceUrl(url)) => raw.source_url = Some(url),
            Some(Location::PdfUrl(url)) => raw.pdf_url = Some(url),
            Some(Location::EmbedCode(code)) => raw.embed_code = Some(code),
            None => {},
        }
        raw
    }
}

impl<'de> Deserialize<'de> for TeacherResource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawResource::deserialize(deserializer)?;
        Self::try_from(raw).map_err(|err| de::Error::custom(&*err))
    }
}
