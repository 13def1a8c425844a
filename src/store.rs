//! Authoring writes. Every operation is one transaction: validation first,
//! then the row changes plus whatever sibling renumbering keeps
//! `display_order` dense. Nothing outside this module and the queries it
//! issues ever writes `display_order` or `is_correct`.

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::db::Db;
use crate::error::ApiError;
use crate::models::*;
use crate::{ordering, validate};

// --- courses ---

pub async fn create_course(db: &Db, req: &CreateCourseReq) -> Result<Course, ApiError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::field("title", "required"));
    }
    let course = sqlx::query_as::<_, Course>(
        "INSERT INTO courses (id, title) VALUES ($1, $2) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .fetch_one(db)
    .await?;
    Ok(course)
}

pub async fn course_exists(db: &Db, course_id: Uuid) -> Result<bool, ApiError> {
    let found = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM courses WHERE id = $1")
        .bind(course_id)
        .fetch_one(db)
        .await?;
    Ok(found > 0)
}

// --- modules ---

pub async fn create_module(
    db: &Db,
    course_id: Uuid,
    draft: &ModuleDraft,
) -> Result<Module, ApiError> {
    let (title, description) = validate::validate_module(draft)?;
    let mut tx = db.begin().await?;

    let known = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM courses WHERE id = $1")
        .bind(course_id)
        .fetch_one(&mut *tx)
        .await?;
    if known == 0 {
        return Err(ApiError::NotFound("course"));
    }

    let count = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM modules WHERE course_id = $1")
        .bind(course_id)
        .fetch_one(&mut *tx)
        .await?;
    let position = ordering::clamp_position(count as usize, draft.position) as i32;

    sqlx::query(
        "UPDATE modules SET display_order = display_order + 1
         WHERE course_id = $1 AND display_order >= $2",
    )
    .bind(course_id)
    .bind(position)
    .execute(&mut *tx)
    .await?;

    let module = sqlx::query_as::<_, Module>(
        "INSERT INTO modules (id, course_id, title, description, display_order)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(course_id)
    .bind(&title)
    .bind(&description)
    .bind(position)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(module)
}

pub async fn update_module(db: &Db, id: Uuid, draft: &ModuleDraft) -> Result<Module, ApiError> {
    let (title, description) = validate::validate_module(draft)?;
    let module = sqlx::query_as::<_, Module>(
        "UPDATE modules SET title = $2, description = $3 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&title)
    .bind(&description)
    .fetch_optional(db)
    .await?
    .ok_or(ApiError::NotFound("module"))?;
    Ok(module)
}

/// Deletes the module (lessons go with it via FK cascade) and closes the gap
/// in the course's module sequence.
pub async fn delete_module(db: &Db, id: Uuid) -> Result<(), ApiError> {
    let mut tx = db.begin().await?;

    let module = sqlx::query_as::<_, Module>("SELECT * FROM modules WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::NotFound("module"))?;

    sqlx::query("DELETE FROM modules WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        "UPDATE modules SET display_order = display_order - 1
         WHERE course_id = $1 AND display_order > $2",
    )
    .bind(module.course_id)
    .bind(module.display_order)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!(module_id=%id, "module deleted");
    Ok(())
}

// --- ordered-id rewrite shared by every reorder path ---

/// Rewrite a parent's child orders from a complete ordered id list. The list
/// must be a permutation of the current children or nothing is written
/// (OrderConflict); on success every child gets `display_order = index + 1`.
/// Calling it twice with the same list is a no-op the second time.
async fn persist_order(
    tx: &mut Transaction<'_, Postgres>,
    table: &str,
    parent_col: &str,
    parent: Uuid,
    ordered_ids: &[Uuid],
) -> Result<(), ApiError> {
    let current = sqlx::query_scalar::<_, Uuid>(&format!(
        "SELECT id FROM {table} WHERE {parent_col} = $1 ORDER BY display_order"
    ))
    .bind(parent)
    .fetch_all(&mut **tx)
    .await?;

    let (missing, unexpected) = ordering::membership_diff(&current, ordered_ids);
    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(ApiError::OrderConflict { missing, unexpected });
    }

    for (id, order) in ordering::renumber(ordered_ids) {
        sqlx::query(&format!("UPDATE {table} SET display_order = $1 WHERE id = $2"))
            .bind(order)
            .bind(id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

pub async fn reorder_modules(db: &Db, req: &ReorderModulesReq) -> Result<(), ApiError> {
    if !course_exists(db, req.course_id).await? {
        return Err(ApiError::NotFound("course"));
    }
    let mut tx = db.begin().await?;
    persist_order(&mut tx, "modules", "course_id", req.course_id, &req.ordered_ids).await?;
    tx.commit().await?;
    Ok(())
}

pub async fn reorder_lessons(db: &Db, req: &ReorderLessonsReq) -> Result<(), ApiError> {
    let mut tx = db.begin().await?;
    let known = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM modules WHERE id = $1")
        .bind(req.module_id)
        .fetch_one(&mut *tx)
        .await?;
    if known == 0 {
        return Err(ApiError::NotFound("module"));
    }
    persist_order(&mut tx, "lessons", "module_id", req.module_id, &req.ordered_ids).await?;
    tx.commit().await?;
    Ok(())
}

// --- lessons ---

pub async fn create_lesson(
    db: &Db,
    module_id: Uuid,
    draft: &LessonDraft,
) -> Result<Lesson, ApiError> {
    let lesson = validate::validate_lesson(draft)?;
    let mut tx = db.begin().await?;

    let known = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM modules WHERE id = $1")
        .bind(module_id)
        .fetch_one(&mut *tx)
        .await?;
    if known == 0 {
        return Err(ApiError::NotFound("module"));
    }

    let count = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM lessons WHERE module_id = $1")
        .bind(module_id)
        .fetch_one(&mut *tx)
        .await?;
    let position = ordering::clamp_position(count as usize, draft.position) as i32;

    sqlx::query(
        "UPDATE lessons SET display_order = display_order + 1
         WHERE module_id = $1 AND display_order >= $2",
    )
    .bind(module_id)
    .bind(position)
    .execute(&mut *tx)
    .await?;

    let cols = lesson.payload.columns();
    let row = sqlx::query_as::<_, LessonRow>(
        "INSERT INTO lessons
           (id, module_id, title, description, lesson_type, display_order,
            is_preview, is_downloadable,
            video_url, file_path, external_url, meeting_url, quiz_id, publish_external)
         VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(module_id)
    .bind(&lesson.title)
    .bind(&lesson.description)
    .bind(lesson.payload.lesson_type())
    .bind(position)
    .bind(lesson.is_preview)
    .bind(lesson.is_downloadable)
    .bind(&cols.video_url)
    .bind(&cols.file_path)
    .bind(&cols.external_url)
    .bind(&cols.meeting_url)
    .bind(cols.quiz_id)
    .bind(cols.publish_external)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row.into())
}

/// Full rewrite of content and payload columns. The payload columns are all
/// written from the new payload, so changing the lesson's type clears the old
/// type's fields in the same statement. `display_order` is untouched here.
pub async fn update_lesson(db: &Db, id: Uuid, draft: &LessonDraft) -> Result<Lesson, ApiError> {
    let lesson = validate::validate_lesson(draft)?;
    let cols = lesson.payload.columns();
    let row = sqlx::query_as::<_, LessonRow>(
        "UPDATE lessons SET
           title = $2, description = $3, lesson_type = $4,
           is_preview = $5, is_downloadable = $6,
           video_url = $7, file_path = $8, external_url = $9,
           meeting_url = $10, quiz_id = $11, publish_external = $12
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&lesson.title)
    .bind(&lesson.description)
    .bind(lesson.payload.lesson_type())
    .bind(lesson.is_preview)
    .bind(lesson.is_downloadable)
    .bind(&cols.video_url)
    .bind(&cols.file_path)
    .bind(&cols.external_url)
    .bind(&cols.meeting_url)
    .bind(cols.quiz_id)
    .bind(cols.publish_external)
    .fetch_optional(db)
    .await?
    .ok_or(ApiError::NotFound("lesson"))?;
    Ok(row.into())
}

pub async fn delete_lesson(db: &Db, id: Uuid) -> Result<(), ApiError> {
    let mut tx = db.begin().await?;

    let row = sqlx::query_as::<_, LessonRow>("SELECT * FROM lessons WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::NotFound("lesson"))?;

    sqlx::query("DELETE FROM lessons WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        "UPDATE lessons SET display_order = display_order - 1
         WHERE module_id = $1 AND display_order > $2",
    )
    .bind(row.module_id)
    .bind(row.display_order)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Drag-and-drop move: splice the lesson out of its slot and reinsert it at
/// the destination, rewriting the whole sibling sequence in one transaction.
pub async fn move_lesson(db: &Db, id: Uuid, to_position: i64) -> Result<Vec<Lesson>, ApiError> {
    let mut tx = db.begin().await?;

    let row = sqlx::query_as::<_, LessonRow>("SELECT * FROM lessons WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ApiError::NotFound("lesson"))?;

    let mut ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM lessons WHERE module_id = $1 ORDER BY display_order",
    )
    .bind(row.module_id)
    .fetch_all(&mut *tx)
    .await?;

    let from = ids.iter().position(|&l| l == id).ok_or(ApiError::NotFound("lesson"))?;
    let to = ordering::clamp_position(ids.len() - 1, Some(to_position)) - 1;
    ordering::splice_move(&mut ids, from, to);
    persist_order(&mut tx, "lessons", "module_id", row.module_id, &ids).await?;

    let rows = sqlx::query_as::<_, LessonRow>(
        "SELECT * FROM lessons WHERE module_id = $1 ORDER BY display_order",
    )
    .bind(row.module_id)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(rows.into_iter().map(Lesson::from).collect())
}

// --- quizzes ---

pub async fn create_quiz(db: &Db, draft: &QuizDraft) -> Result<Quiz, ApiError> {
    let (title, description) = validate::validate_quiz(draft)?;
    if !course_exists(db, draft.course_id).await? {
        return Err(ApiError::NotFound("course"));
    }
    let quiz = sqlx::query_as::<_, Quiz>(
        "INSERT INTO quizzes
           (id, course_id, module_id, title, description,
            pass_percentage, time_limit_minutes, attempts_allowed)
         VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(draft.course_id)
    .bind(draft.module_id)
    .bind(&title)
    .bind(&description)
    .bind(draft.pass_percentage as i32)
    .bind(draft.time_limit_minutes as i32)
    .bind(draft.attempts_allowed as i32)
    .fetch_one(db)
    .await?;
    Ok(quiz)
}

pub async fn list_quizzes(db: &Db, course_id: Uuid) -> Result<Vec<Quiz>, ApiError> {
    let quizzes = sqlx::query_as::<_, Quiz>(
        "SELECT * FROM quizzes WHERE course_id = $1 ORDER BY created_at",
    )
    .bind(course_id)
    .fetch_all(db)
    .await?;
    Ok(quizzes)
}

pub async fn add_question(db: &Db, draft: &QuestionDraft) -> Result<Question, ApiError> {
    let text = validate::validate_question(draft)?;
    let mut tx = db.begin().await?;

    let known = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM quizzes WHERE id = $1")
        .bind(draft.quiz_id)
        .fetch_one(&mut *tx)
        .await?;
    if known == 0 {
        return Err(ApiError::NotFound("quiz"));
    }

    let count = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM questions WHERE quiz_id = $1")
        .bind(draft.quiz_id)
        .fetch_one(&mut *tx)
        .await?;

    let question = sqlx::query_as::<_, Question>(
        "INSERT INTO questions (id, quiz_id, text, question_type, score, display_order)
         VALUES ($1,$2,$3,$4,$5,$6) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(draft.quiz_id)
    .bind(&text)
    .bind(draft.question_type)
    .bind(draft.score as i32)
    .bind(count as i32 + 1)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(question)
}

/// Replace a question's option set whole. A set that fails validation (blank
/// text, or a correct-count other than one) persists nothing and leaves any
/// previously saved options in place.
pub async fn set_options(db: &Db, req: &SetOptionsReq) -> Result<Vec<QuestionOption>, ApiError> {
    let options = validate::validate_options(&req.options)?;
    let mut tx = db.begin().await?;

    let known = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM questions WHERE id = $1")
        .bind(req.question_id)
        .fetch_one(&mut *tx)
        .await?;
    if known == 0 {
        return Err(ApiError::NotFound("question"));
    }

    sqlx::query("DELETE FROM question_options WHERE question_id = $1")
        .bind(req.question_id)
        .execute(&mut *tx)
        .await?;

    let mut saved = Vec::with_capacity(options.len());
    for opt in &options {
        let row = sqlx::query_as::<_, QuestionOption>(
            "INSERT INTO question_options (id, question_id, text, is_correct, display_order)
             VALUES ($1,$2,$3,$4,$5)
             RETURNING id, question_id, text, is_correct, display_order",
        )
        .bind(Uuid::new_v4())
        .bind(req.question_id)
        .bind(&opt.text)
        .bind(opt.is_correct)
        .bind(opt.display_order)
        .fetch_one(&mut *tx)
        .await?;
        saved.push(row);
    }

    tx.commit().await?;
    Ok(saved)
}

pub async fn list_questions(db: &Db, quiz_id: Uuid) -> Result<Vec<QuestionWithOptions>, ApiError> {
    let questions = sqlx::query_as::<_, Question>(
        "SELECT * FROM questions WHERE quiz_id = $1 ORDER BY display_order",
    )
    .bind(quiz_id)
    .fetch_all(db)
    .await?;

    let question_ids: Vec<Uuid> = questions.iter().map(|q| q.id).collect();
    let options = sqlx::query_as::<_, QuestionOption>(
        "SELECT id, question_id, text, is_correct, display_order FROM question_options
         WHERE question_id = ANY($1) ORDER BY display_order",
    )
    .bind(&question_ids)
    .fetch_all(db)
    .await?;

    Ok(questions
        .into_iter()
        .map(|question| {
            let options = options
                .iter()
                .filter(|o| o.question_id == question.id)
                .cloned()
                .collect();
            QuestionWithOptions { question, options }
        })
        .collect())
}

pub async fn get_quiz(db: &Db, id: Uuid) -> Result<(Quiz, Vec<QuestionWithOptions>), ApiError> {
    let quiz = sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(ApiError::NotFound("quiz"))?;
    let questions = list_questions(db, id).await?;
    Ok((quiz, questions))
}
