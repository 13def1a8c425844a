use axum::{
    extract::{Multipart, Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::Db;
use crate::error::ApiError;
use crate::models::*;
use crate::{store, tree, uploads};

pub fn router(db: Db) -> Router {
    let static_dir = std::env::var("DATA_DIR").unwrap_or("./data".into());
    Router::new()
        // curriculum
        .route("/api/courses", post(create_course))
        .route("/api/courses/:course_id/tree", get(course_tree))
        .route(
            "/api/courses/:course_id/modules",
            get(course_modules).post(create_module),
        )
        .route("/api/modules/reorder", post(reorder_modules))
        .route("/api/modules/:id", put(update_module).delete(delete_module))
        .route("/api/modules/:module_id/lessons", post(create_lesson))
        .route("/api/lessons/reorder", post(reorder_lessons))
        .route("/api/lessons/:id", put(update_lesson).delete(delete_lesson))
        .route("/api/lessons/:id/move", post(move_lesson))
        // quiz authoring
        .route("/api/quizzes", get(list_quizzes).post(create_quiz))
        .route("/api/quizzes/question", post(add_question))
        .route("/api/quizzes/options", post(set_options))
        .route("/api/quizzes/:id", get(get_quiz))
        // stored lesson files
        .nest_service("/content", tower_http::services::ServeDir::new(static_dir))
        .with_state(db)
}

// --- courses & tree ---

async fn create_course(
    State(db): State<Db>,
    Json(req): Json<CreateCourseReq>,
) -> Result<Json<Course>, ApiError> {
    Ok(Json(store::create_course(&db, &req).await?))
}

async fn course_tree(
    State(db): State<Db>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<tree::CurriculumTree>, ApiError> {
    Ok(Json(tree::assemble(&db, course_id).await?))
}

async fn course_modules(
    State(db): State<Db>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Vec<tree::ModuleNode>>, ApiError> {
    Ok(Json(tree::assemble(&db, course_id).await?.modules))
}

// --- modules ---

async fn create_module(
    State(db): State<Db>,
    Path(course_id): Path<Uuid>,
    Json(draft): Json<ModuleDraft>,
) -> Result<Json<Module>, ApiError> {
    Ok(Json(store::create_module(&db, course_id, &draft).await?))
}

async fn update_module(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(draft): Json<ModuleDraft>,
) -> Result<Json<Module>, ApiError> {
    Ok(Json(store::update_module(&db, id, &draft).await?))
}

async fn delete_module(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    store::delete_module(&db, id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn reorder_modules(
    State(db): State<Db>,
    Json(req): Json<ReorderModulesReq>,
) -> Result<Json<serde_json::Value>, ApiError> {
    store::reorder_modules(&db, &req).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

// --- lessons ---

async fn create_lesson(
    State(db): State<Db>,
    Path(module_id): Path<Uuid>,
    mp: Multipart,
) -> Result<Json<Lesson>, ApiError> {
    let (draft, uploaded) = lesson_draft_from_multipart(mp).await?;
    match store::create_lesson(&db, module_id, &draft).await {
        Ok(lesson) => Ok(Json(lesson)),
        Err(e) => {
            discard_upload(uploaded).await;
            Err(e)
        }
    }
}

async fn update_lesson(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    mp: Multipart,
) -> Result<Json<Lesson>, ApiError> {
    let (draft, uploaded) = lesson_draft_from_multipart(mp).await?;
    match store::update_lesson(&db, id, &draft).await {
        Ok(lesson) => Ok(Json(lesson)),
        Err(e) => {
            discard_upload(uploaded).await;
            Err(e)
        }
    }
}

/// A rejected draft must not leave its just-uploaded file behind. Only the
/// fresh upload is removed; an echoed file_path points at a file some
/// persisted lesson may still own.
async fn discard_upload(uploaded: Option<String>) {
    if let Some(rel) = uploaded {
        uploads::remove_file(&rel).await;
    }
}

async fn delete_lesson(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    store::delete_lesson(&db, id).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn move_lesson(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(req): Json<MoveLessonReq>,
) -> Result<Json<Vec<Lesson>>, ApiError> {
    Ok(Json(store::move_lesson(&db, id, req.to_position).await?))
}

async fn reorder_lessons(
    State(db): State<Db>,
    Json(req): Json<ReorderLessonsReq>,
) -> Result<Json<serde_json::Value>, ApiError> {
    store::reorder_lessons(&db, &req).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// Lesson forms arrive as multipart so file-backed types can carry their
/// upload in the same request. Returns the draft plus the relative path of a
/// freshly stored upload, if any, so the caller can clean it up when the
/// write is rejected. Unknown fields are ignored; the validator decides what
/// the chosen type actually requires.
async fn lesson_draft_from_multipart(
    mut mp: Multipart,
) -> Result<(LessonDraft, Option<String>), ApiError> {
    let mut draft = LessonDraft::default();
    let mut uploaded = None;
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            let filename = field.file_name().unwrap_or("upload.bin").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            let rel = uploads::store_file(&filename, &bytes).await?;
            uploaded = Some(rel.clone());
            draft.file_path = Some(rel);
            continue;
        }
        let value = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        apply_text_field(&mut draft, &name, value)?;
    }
    Ok((draft, uploaded))
}

/// Text-field arm of the lesson form. `file_path` may be echoed back so a
/// metadata edit of a file-backed lesson does not force a re-upload.
fn apply_text_field(draft: &mut LessonDraft, name: &str, value: String) -> Result<(), ApiError> {
    match name {
        "title" => draft.title = value,
        "description" => draft.description = value,
        "type" => draft.lesson_type = Some(value),
        "video_url" => draft.video_url = Some(value),
        "file_path" => draft.file_path = Some(value),
        "external_url" => draft.external_url = Some(value),
        "meeting_url" => draft.meeting_url = Some(value),
        "quiz_id" => {
            draft.quiz_id = Some(
                value
                    .parse()
                    .map_err(|_| ApiError::BadRequest("quiz_id must be a uuid".into()))?,
            )
        }
        "publish_external" => draft.publish_external = truthy(&value),
        "is_preview" => draft.is_preview = truthy(&value),
        "is_downloadable" => draft.is_downloadable = truthy(&value),
        "position" => {
            draft.position = Some(
                value
                    .parse()
                    .map_err(|_| ApiError::BadRequest("position must be an integer".into()))?,
            )
        }
        _ => {}
    }
    Ok(())
}

fn truthy(v: &str) -> bool {
    matches!(v, "true" | "1" | "on")
}

// --- quizzes ---

#[derive(Deserialize)]
struct QuizListParams {
    course_id: Uuid,
}

async fn list_quizzes(
    State(db): State<Db>,
    Query(params): Query<QuizListParams>,
) -> Result<Json<Vec<Quiz>>, ApiError> {
    Ok(Json(store::list_quizzes(&db, params.course_id).await?))
}

async fn create_quiz(
    State(db): State<Db>,
    Json(draft): Json<QuizDraft>,
) -> Result<Json<Quiz>, ApiError> {
    Ok(Json(store::create_quiz(&db, &draft).await?))
}

async fn add_question(
    State(db): State<Db>,
    Json(draft): Json<QuestionDraft>,
) -> Result<Json<Question>, ApiError> {
    Ok(Json(store::add_question(&db, &draft).await?))
}

async fn set_options(
    State(db): State<Db>,
    Json(req): Json<SetOptionsReq>,
) -> Result<Json<Vec<QuestionOption>>, ApiError> {
    Ok(Json(store::set_options(&db, &req).await?))
}

async fn get_quiz(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (quiz, questions) = store::get_quiz(&db, id).await?;
    Ok(Json(serde_json::json!({ "quiz": quiz, "questions": questions })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate;

    #[test]
    fn echoed_file_path_survives_a_metadata_edit() {
        // a pdf lesson edited without re-uploading: the form echoes the
        // stored file_path as a plain text field and validation still passes
        let mut draft = LessonDraft::default();
        apply_text_field(&mut draft, "title", "Sicilian Defence".into()).unwrap();
        apply_text_field(&mut draft, "description", "Annotated games and theory.".into())
            .unwrap();
        apply_text_field(&mut draft, "type", "pdf".into()).unwrap();
        apply_text_field(&mut draft, "file_path", "uploads/abc_slides.pdf".into()).unwrap();

        let lesson = validate::validate_lesson(&draft).unwrap();
        assert_eq!(
            lesson.payload,
            LessonPayload::Pdf { file_path: "uploads/abc_slides.pdf".into() }
        );
    }

    #[test]
    fn boolean_and_numeric_fields_parse() {
        let mut draft = LessonDraft::default();
        apply_text_field(&mut draft, "is_preview", "true".into()).unwrap();
        apply_text_field(&mut draft, "is_downloadable", "0".into()).unwrap();
        apply_text_field(&mut draft, "position", "2".into()).unwrap();
        assert!(draft.is_preview);
        assert!(!draft.is_downloadable);
        assert_eq!(draft.position, Some(2));

        assert!(apply_text_field(&mut draft, "position", "second".into()).is_err());
        assert!(apply_text_field(&mut draft, "quiz_id", "not-a-uuid".into()).is_err());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let mut draft = LessonDraft::default();
        apply_text_field(&mut draft, "csrf_token", "abc".into()).unwrap();
        assert_eq!(draft.title, "");
        assert!(draft.lesson_type.is_none());
    }
}
