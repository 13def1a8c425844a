//! Read side: compose the ordered curriculum tree a client renders. Pure
//! read/compose — no validation, no mutation; a missing course is a hard
//! "not found", never a partial tree.

use serde::Serialize;
use uuid::Uuid;

use crate::db::Db;
use crate::error::ApiError;
use crate::models::{Course, Lesson, LessonPayload, LessonRow, Module, QuizSummary};

#[derive(Serialize, Debug, Clone)]
pub struct CurriculumTree {
    #[serde(flatten)]
    pub course: Course,
    pub modules: Vec<ModuleNode>,
}

#[derive(Serialize, Debug, Clone)]
pub struct ModuleNode {
    #[serde(flatten)]
    pub module: Module,
    pub lessons: Vec<LessonNode>,
}

#[derive(Serialize, Debug, Clone)]
pub struct LessonNode {
    #[serde(flatten)]
    pub lesson: Lesson,
    /// Resolved for lessons of type quiz that have one attached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz: Option<QuizSummary>,
}

pub async fn assemble(db: &Db, course_id: Uuid) -> Result<CurriculumTree, ApiError> {
    let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
        .bind(course_id)
        .fetch_optional(db)
        .await?
        .ok_or(ApiError::NotFound("course"))?;

    let modules = sqlx::query_as::<_, Module>(
        "SELECT * FROM modules WHERE course_id = $1 ORDER BY display_order",
    )
    .bind(course_id)
    .fetch_all(db)
    .await?;

    let module_ids: Vec<Uuid> = modules.iter().map(|m| m.id).collect();
    let lesson_rows = sqlx::query_as::<_, LessonRow>(
        "SELECT * FROM lessons WHERE module_id = ANY($1) ORDER BY display_order",
    )
    .bind(&module_ids)
    .fetch_all(db)
    .await?;
    let lessons: Vec<Lesson> = lesson_rows.into_iter().map(Lesson::from).collect();

    let quiz_ids: Vec<Uuid> = lessons
        .iter()
        .filter_map(|l| match l.payload {
            LessonPayload::Quiz { quiz_id } => quiz_id,
            _ => None,
        })
        .collect();
    let summaries = quiz_summaries(db, &quiz_ids).await?;

    let modules = modules
        .into_iter()
        .map(|module| {
            let lessons = lessons
                .iter()
                .filter(|l| l.module_id == module.id)
                .cloned()
                .map(|lesson| {
                    let quiz = match lesson.payload {
                        LessonPayload::Quiz { quiz_id: Some(qid) } => {
                            summaries.iter().find(|s| s.id == qid).cloned()
                        }
                        _ => None,
                    };
                    LessonNode { lesson, quiz }
                })
                .collect();
            ModuleNode { module, lessons }
        })
        .collect();

    Ok(CurriculumTree { course, modules })
}

async fn quiz_summaries(db: &Db, quiz_ids: &[Uuid]) -> Result<Vec<QuizSummary>, ApiError> {
    if quiz_ids.is_empty() {
        return Ok(Vec::new());
    }
    let summaries = sqlx::query_as::<_, QuizSummary>(
        "SELECT q.id, q.title, count(n.id) AS question_count
         FROM quizzes q
         LEFT JOIN questions n ON n.quiz_id = q.id
         WHERE q.id = ANY($1)
         GROUP BY q.id, q.title",
    )
    .bind(quiz_ids)
    .fetch_all(db)
    .await?;
    Ok(summaries)
}
