use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Module {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::Type, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "lesson_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LessonType {
    Text,
    Video,
    Pdf,
    Ppt,
    Link,
    Live,
    Quiz,
}

impl FromStr for LessonType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "text" => Ok(Self::Text),
            "video" => Ok(Self::Video),
            "pdf" => Ok(Self::Pdf),
            "ppt" => Ok(Self::Ppt),
            "link" => Ok(Self::Link),
            "live" => Ok(Self::Live),
            "quiz" => Ok(Self::Quiz),
            _ => Err(()),
        }
    }
}

/// Type-specific fields of a lesson. Exactly one variant is populated and it
/// always matches the lesson's type; rewriting a lesson with a different
/// variant drops the old fields because every payload column is written from
/// the new variant.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LessonPayload {
    Text,
    Video {
        video_url: Option<String>,
        file_path: Option<String>,
        publish_external: bool,
    },
    Pdf {
        file_path: String,
    },
    Ppt {
        file_path: String,
    },
    Link {
        external_url: String,
    },
    Live {
        meeting_url: String,
    },
    Quiz {
        quiz_id: Option<Uuid>,
    },
}

impl LessonPayload {
    pub fn lesson_type(&self) -> LessonType {
        match self {
            Self::Text => LessonType::Text,
            Self::Video { .. } => LessonType::Video,
            Self::Pdf { .. } => LessonType::Pdf,
            Self::Ppt { .. } => LessonType::Ppt,
            Self::Link { .. } => LessonType::Link,
            Self::Live { .. } => LessonType::Live,
            Self::Quiz { .. } => LessonType::Quiz,
        }
    }

    /// Flatten into the per-column shape the lessons table stores. Columns not
    /// owned by the variant come back None/false, so a type switch clears the
    /// previous payload on write.
    pub fn columns(&self) -> PayloadColumns {
        let mut c = PayloadColumns::default();
        match self {
            Self::Text => {}
            Self::Video { video_url, file_path, publish_external } => {
                c.video_url = video_url.clone();
                c.file_path = file_path.clone();
                c.publish_external = *publish_external;
            }
            Self::Pdf { file_path } | Self::Ppt { file_path } => {
                c.file_path = Some(file_path.clone());
            }
            Self::Link { external_url } => c.external_url = Some(external_url.clone()),
            Self::Live { meeting_url } => c.meeting_url = Some(meeting_url.clone()),
            Self::Quiz { quiz_id } => c.quiz_id = *quiz_id,
        }
        c
    }
}

#[derive(Debug, Clone, Default)]
pub struct PayloadColumns {
    pub video_url: Option<String>,
    pub file_path: Option<String>,
    pub external_url: Option<String>,
    pub meeting_url: Option<String>,
    pub quiz_id: Option<Uuid>,
    pub publish_external: bool,
}

/// Raw lessons row; payload fields are flat nullable columns.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct LessonRow {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub description: String,
    pub lesson_type: LessonType,
    pub display_order: i32,
    pub is_preview: bool,
    pub is_downloadable: bool,
    pub video_url: Option<String>,
    pub file_path: Option<String>,
    pub external_url: Option<String>,
    pub meeting_url: Option<String>,
    pub quiz_id: Option<Uuid>,
    pub publish_external: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Lesson {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub description: String,
    pub display_order: i32,
    pub is_preview: bool,
    pub is_downloadable: bool,
    #[serde(flatten)]
    pub payload: LessonPayload,
    pub created_at: DateTime<Utc>,
}

impl From<LessonRow> for Lesson {
    fn from(row: LessonRow) -> Self {
        let payload = match row.lesson_type {
            LessonType::Text => LessonPayload::Text,
            LessonType::Video => LessonPayload::Video {
                video_url: row.video_url,
                file_path: row.file_path,
                publish_external: row.publish_external,
            },
            LessonType::Pdf => LessonPayload::Pdf {
                file_path: row.file_path.unwrap_or_default(),
            },
            LessonType::Ppt => LessonPayload::Ppt {
                file_path: row.file_path.unwrap_or_default(),
            },
            LessonType::Link => LessonPayload::Link {
                external_url: row.external_url.unwrap_or_default(),
            },
            LessonType::Live => LessonPayload::Live {
                meeting_url: row.meeting_url.unwrap_or_default(),
            },
            LessonType::Quiz => LessonPayload::Quiz { quiz_id: row.quiz_id },
        };
        Self {
            id: row.id,
            module_id: row.module_id,
            title: row.title,
            description: row.description,
            display_order: row.display_order,
            is_preview: row.is_preview,
            is_downloadable: row.is_downloadable,
            payload,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Quiz {
    pub id: Uuid,
    pub course_id: Uuid,
    pub module_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub pass_percentage: i32,
    pub time_limit_minutes: i32,
    pub attempts_allowed: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::Type, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "question_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    TrueFalse,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Question {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub text: String,
    pub question_type: QuestionType,
    pub score: i32,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct QuestionOption {
    pub id: Uuid,
    pub question_id: Uuid,
    pub text: String,
    pub is_correct: bool,
    pub display_order: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QuestionWithOptions {
    #[serde(flatten)]
    pub question: Question,
    pub options: Vec<QuestionOption>,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct QuizSummary {
    pub id: Uuid,
    pub title: String,
    pub question_count: i64,
}

// --- Authoring request payloads ---

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateCourseReq {
    pub title: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ModuleDraft {
    pub title: String,
    pub description: String,
    /// One-based insert position; omitted means append.
    pub position: Option<i64>,
}

/// Flat lesson draft as it arrives from the authoring form (multipart fields).
/// `validate::validate_lesson` turns it into a typed payload or a field error
/// map.
#[derive(Debug, Clone, Default)]
pub struct LessonDraft {
    pub title: String,
    pub description: String,
    pub lesson_type: Option<String>,
    pub video_url: Option<String>,
    pub file_path: Option<String>,
    pub external_url: Option<String>,
    pub meeting_url: Option<String>,
    pub quiz_id: Option<Uuid>,
    pub publish_external: bool,
    pub is_preview: bool,
    pub is_downloadable: bool,
    pub position: Option<i64>,
}

/// A lesson draft that passed validation: trimmed text and a payload matching
/// its type.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLesson {
    pub title: String,
    pub description: String,
    pub is_preview: bool,
    pub is_downloadable: bool,
    pub payload: LessonPayload,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReorderModulesReq {
    pub course_id: Uuid,
    pub ordered_ids: Vec<Uuid>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReorderLessonsReq {
    pub module_id: Uuid,
    pub ordered_ids: Vec<Uuid>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MoveLessonReq {
    /// One-based destination among the lesson's siblings.
    pub to_position: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QuizDraft {
    pub course_id: Uuid,
    pub module_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub pass_percentage: i64,
    pub time_limit_minutes: i64,
    pub attempts_allowed: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QuestionDraft {
    pub quiz_id: Uuid,
    pub text: String,
    pub question_type: QuestionType,
    pub score: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OptionDraft {
    pub text: String,
    pub is_correct: bool,
}

/// An option set that passed validation: trimmed texts carrying their
/// submitted position, so reads come back in authoring order.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedOption {
    pub text: String,
    pub is_correct: bool,
    pub display_order: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SetOptionsReq {
    pub question_id: Uuid,
    pub options: Vec<OptionDraft>,
}
