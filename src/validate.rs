//! Pure validators for authoring drafts. No I/O; every function either
//! normalizes the draft or returns the complete field -> message map so the
//! client can mark all offending inputs at once.

use crate::error::{ApiError, FieldErrors};
use crate::models::{
    LessonDraft, LessonPayload, LessonType, ModuleDraft, NormalizedLesson, NormalizedOption,
    OptionDraft, QuestionDraft, QuizDraft,
};
use std::str::FromStr;

const TITLE_MIN: usize = 3;
const TITLE_MAX: usize = 100;
const DESCRIPTION_MIN: usize = 10;

fn check_title(errors: &mut FieldErrors, title: &str) {
    let len = title.trim().chars().count();
    if len == 0 {
        errors.insert("title".into(), "required".into());
    } else if len < TITLE_MIN || len > TITLE_MAX {
        errors.insert(
            "title".into(),
            format!("must be between {TITLE_MIN} and {TITLE_MAX} characters"),
        );
    }
}

fn check_description(errors: &mut FieldErrors, description: &str) {
    let len = description.trim().chars().count();
    if len == 0 {
        errors.insert("description".into(), "required".into());
    } else if len < DESCRIPTION_MIN {
        errors.insert(
            "description".into(),
            format!("must be at least {DESCRIPTION_MIN} characters"),
        );
    }
}

fn non_empty(s: &Option<String>) -> Option<String> {
    s.as_deref().map(str::trim).filter(|t| !t.is_empty()).map(String::from)
}

pub fn validate_module(draft: &ModuleDraft) -> Result<(String, String), ApiError> {
    let mut errors = FieldErrors::new();
    check_title(&mut errors, &draft.title);
    check_description(&mut errors, &draft.description);
    if errors.is_empty() {
        Ok((draft.title.trim().to_string(), draft.description.trim().to_string()))
    } else {
        Err(ApiError::Validation(errors))
    }
}

/// The lesson type registry: which payload fields each type requires, applied
/// after the common title/description rules. All failures are collected.
pub fn validate_lesson(draft: &LessonDraft) -> Result<NormalizedLesson, ApiError> {
    let mut errors = FieldErrors::new();
    check_title(&mut errors, &draft.title);
    check_description(&mut errors, &draft.description);

    let lesson_type = match draft.lesson_type.as_deref().map(str::trim) {
        None | Some("") => {
            errors.insert("type".into(), "required".into());
            None
        }
        Some(raw) => match LessonType::from_str(raw) {
            Ok(t) => Some(t),
            Err(()) => {
                errors.insert(
                    "type".into(),
                    "must be one of text, video, pdf, ppt, link, live, quiz".into(),
                );
                None
            }
        },
    };

    let video_url = non_empty(&draft.video_url);
    let file_path = non_empty(&draft.file_path);
    let external_url = non_empty(&draft.external_url);
    let meeting_url = non_empty(&draft.meeting_url);

    let payload = match lesson_type {
        None => None,
        Some(LessonType::Text) => Some(LessonPayload::Text),
        Some(LessonType::Video) => {
            if video_url.is_none() && file_path.is_none() {
                errors.insert(
                    "video_url".into(),
                    "a video url or an uploaded file is required".into(),
                );
                None
            } else {
                Some(LessonPayload::Video {
                    video_url,
                    file_path,
                    publish_external: draft.publish_external,
                })
            }
        }
        Some(LessonType::Pdf) => match file_path {
            Some(file_path) => Some(LessonPayload::Pdf { file_path }),
            None => {
                errors.insert("file".into(), "required".into());
                None
            }
        },
        Some(LessonType::Ppt) => match file_path {
            Some(file_path) => Some(LessonPayload::Ppt { file_path }),
            None => {
                errors.insert("file".into(), "required".into());
                None
            }
        },
        Some(LessonType::Link) => match external_url {
            Some(external_url) => Some(LessonPayload::Link { external_url }),
            None => {
                errors.insert("external_url".into(), "required".into());
                None
            }
        },
        Some(LessonType::Live) => match meeting_url {
            Some(meeting_url) => Some(LessonPayload::Live { meeting_url }),
            None => {
                errors.insert("meeting_url".into(), "required".into());
                None
            }
        },
        Some(LessonType::Quiz) => Some(LessonPayload::Quiz { quiz_id: draft.quiz_id }),
    };

    match (payload, errors.is_empty()) {
        (Some(payload), true) => Ok(NormalizedLesson {
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            is_preview: draft.is_preview,
            is_downloadable: draft.is_downloadable,
            payload,
        }),
        _ => Err(ApiError::Validation(errors)),
    }
}

pub fn validate_quiz(draft: &QuizDraft) -> Result<(String, String), ApiError> {
    let mut errors = FieldErrors::new();
    check_title(&mut errors, &draft.title);
    check_description(&mut errors, &draft.description);
    if !(0..=100).contains(&draft.pass_percentage) {
        errors.insert("pass_percentage".into(), "must be between 0 and 100".into());
    }
    // drafts arrive as i64 but the columns are i32; out-of-range values would
    // wrap at the bind, so the range check happens here
    if draft.time_limit_minutes <= 0 || draft.time_limit_minutes > i32::MAX as i64 {
        errors.insert(
            "time_limit_minutes".into(),
            format!("must be between 1 and {}", i32::MAX),
        );
    }
    if draft.attempts_allowed < 1 || draft.attempts_allowed > i32::MAX as i64 {
        errors.insert(
            "attempts_allowed".into(),
            format!("must be between 1 and {}", i32::MAX),
        );
    }
    if errors.is_empty() {
        Ok((draft.title.trim().to_string(), draft.description.trim().to_string()))
    } else {
        Err(ApiError::Validation(errors))
    }
}

pub fn validate_question(draft: &QuestionDraft) -> Result<String, ApiError> {
    let mut errors = FieldErrors::new();
    let text = draft.text.trim();
    if text.is_empty() {
        errors.insert("text".into(), "required".into());
    }
    if draft.score < 1 || draft.score > i32::MAX as i64 {
        errors.insert("score".into(), format!("must be between 1 and {}", i32::MAX));
    }
    if errors.is_empty() {
        Ok(text.to_string())
    } else {
        Err(ApiError::Validation(errors))
    }
}

/// A question's option set is written whole or not at all: at least two
/// options, no blank texts, and exactly one marked correct. Accepted sets
/// keep their submitted order via `display_order`.
pub fn validate_options(options: &[OptionDraft]) -> Result<Vec<NormalizedOption>, ApiError> {
    let mut errors = FieldErrors::new();
    if options.len() < 2 {
        errors.insert("options".into(), "at least 2 options are required".into());
    }
    for (i, opt) in options.iter().enumerate() {
        if opt.text.trim().is_empty() {
            errors.insert(format!("options[{i}].text"), "required".into());
        }
    }
    let correct = options.iter().filter(|o| o.is_correct).count();
    if correct != 1 {
        errors.insert(
            "is_correct".into(),
            format!("exactly one option must be correct, found {correct}"),
        );
    }
    if errors.is_empty() {
        Ok(options
            .iter()
            .enumerate()
            .map(|(i, o)| NormalizedOption {
                text: o.text.trim().to_string(),
                is_correct: o.is_correct,
                display_order: i as i32 + 1,
            })
            .collect())
    } else {
        Err(ApiError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionType;
    use uuid::Uuid;

    fn draft(lesson_type: &str) -> LessonDraft {
        LessonDraft {
            title: "King's Pawn".into(),
            description: "Opening theory for 1. e4 and common replies.".into(),
            lesson_type: Some(lesson_type.into()),
            ..Default::default()
        }
    }

    #[test]
    fn video_with_url_is_accepted() {
        let mut d = draft("video");
        d.video_url = Some("https://x/y".into());
        let lesson = validate_lesson(&d).unwrap();
        assert_eq!(
            lesson.payload,
            LessonPayload::Video {
                video_url: Some("https://x/y".into()),
                file_path: None,
                publish_external: false,
            }
        );
    }

    #[test]
    fn video_without_source_is_rejected() {
        let err = validate_lesson(&draft("video")).unwrap_err();
        let ApiError::Validation(errors) = err else { panic!("expected validation error") };
        assert!(errors.contains_key("video_url"));
    }

    #[test]
    fn pdf_without_file_reports_file_required() {
        let mut d = draft("pdf");
        d.title = "Sicilian".into();
        let ApiError::Validation(errors) = validate_lesson(&d).unwrap_err() else {
            panic!("expected validation error")
        };
        assert_eq!(errors.get("file").map(String::as_str), Some("required"));
    }

    #[test]
    fn all_field_errors_are_collected() {
        let d = LessonDraft {
            title: "ab".into(),
            description: "short".into(),
            lesson_type: Some("link".into()),
            ..Default::default()
        };
        let ApiError::Validation(errors) = validate_lesson(&d).unwrap_err() else {
            panic!("expected validation error")
        };
        assert!(errors.contains_key("title"));
        assert!(errors.contains_key("description"));
        assert!(errors.contains_key("external_url"));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let ApiError::Validation(errors) = validate_lesson(&draft("podcast")).unwrap_err() else {
            panic!("expected validation error")
        };
        assert!(errors.contains_key("type"));
    }

    #[test]
    fn quiz_lesson_needs_no_quiz_attached() {
        let lesson = validate_lesson(&draft("quiz")).unwrap();
        assert_eq!(lesson.payload, LessonPayload::Quiz { quiz_id: None });
    }

    #[test]
    fn switching_type_drops_the_old_payload() {
        // Same form fields, resubmitted with a different type: the link
        // payload must not carry any video leftovers.
        let mut d = draft("video");
        d.video_url = Some("https://x/y".into());
        d.external_url = Some("https://example.com/article".into());
        let video = validate_lesson(&d).unwrap();
        assert_eq!(video.payload.lesson_type(), LessonType::Video);

        d.lesson_type = Some("link".into());
        let link = validate_lesson(&d).unwrap();
        assert_eq!(
            link.payload,
            LessonPayload::Link { external_url: "https://example.com/article".into() }
        );
        let cols = link.payload.columns();
        assert_eq!(cols.video_url, None);
        assert_eq!(cols.file_path, None);
    }

    #[test]
    fn titles_and_urls_are_trimmed() {
        let mut d = draft("link");
        d.title = "  Endgames  ".into();
        d.external_url = Some("  https://example.com  ".into());
        let lesson = validate_lesson(&d).unwrap();
        assert_eq!(lesson.title, "Endgames");
        assert_eq!(
            lesson.payload,
            LessonPayload::Link { external_url: "https://example.com".into() }
        );
    }

    fn quiz_draft() -> QuizDraft {
        QuizDraft {
            course_id: Uuid::new_v4(),
            module_id: None,
            title: "Tactics check".into(),
            description: "Short assessment on basic tactics.".into(),
            pass_percentage: 70,
            time_limit_minutes: 15,
            attempts_allowed: 3,
        }
    }

    #[test]
    fn quiz_meta_bounds() {
        assert!(validate_quiz(&quiz_draft()).is_ok());

        let mut d = quiz_draft();
        d.pass_percentage = 101;
        d.time_limit_minutes = 0;
        d.attempts_allowed = 0;
        let ApiError::Validation(errors) = validate_quiz(&d).unwrap_err() else {
            panic!("expected validation error")
        };
        assert!(errors.contains_key("pass_percentage"));
        assert!(errors.contains_key("time_limit_minutes"));
        assert!(errors.contains_key("attempts_allowed"));
    }

    #[test]
    fn quiz_numbers_past_i32_are_rejected() {
        // these land in INT columns; anything past i32::MAX must fail
        // validation instead of wrapping at the bind
        let mut d = quiz_draft();
        d.time_limit_minutes = i32::MAX as i64 + 1;
        d.attempts_allowed = i32::MAX as i64 + 1;
        let ApiError::Validation(errors) = validate_quiz(&d).unwrap_err() else {
            panic!("expected validation error")
        };
        assert!(errors.contains_key("time_limit_minutes"));
        assert!(errors.contains_key("attempts_allowed"));

        let mut d = quiz_draft();
        d.time_limit_minutes = i32::MAX as i64;
        d.attempts_allowed = i32::MAX as i64;
        assert!(validate_quiz(&d).is_ok());
    }

    #[test]
    fn question_score_past_i32_is_rejected() {
        let d = QuestionDraft {
            quiz_id: Uuid::new_v4(),
            text: "2+2=?".into(),
            question_type: QuestionType::Mcq,
            score: i32::MAX as i64 + 1,
        };
        let ApiError::Validation(errors) = validate_question(&d).unwrap_err() else {
            panic!("expected validation error")
        };
        assert!(errors.contains_key("score"));
    }

    fn options(correct_flags: &[bool]) -> Vec<OptionDraft> {
        correct_flags
            .iter()
            .enumerate()
            .map(|(i, &is_correct)| OptionDraft { text: format!("option {i}"), is_correct })
            .collect()
    }

    #[test]
    fn exactly_one_correct_option_is_enforced() {
        assert!(validate_options(&options(&[false, true, false, false])).is_ok());

        let ApiError::Validation(errors) =
            validate_options(&options(&[true, true, false, false])).unwrap_err()
        else {
            panic!("expected validation error")
        };
        assert_eq!(
            errors.get("is_correct").map(String::as_str),
            Some("exactly one option must be correct, found 2")
        );

        let ApiError::Validation(errors) =
            validate_options(&options(&[false, false])).unwrap_err()
        else {
            panic!("expected validation error")
        };
        assert!(errors.get("is_correct").unwrap().contains("found 0"));
    }

    #[test]
    fn option_order_follows_submission() {
        let opts = vec![
            OptionDraft { text: "  Nf3 ".into(), is_correct: false },
            OptionDraft { text: "e4".into(), is_correct: true },
            OptionDraft { text: "d4".into(), is_correct: false },
        ];
        let normalized = validate_options(&opts).unwrap();
        assert_eq!(
            normalized,
            vec![
                NormalizedOption { text: "Nf3".into(), is_correct: false, display_order: 1 },
                NormalizedOption { text: "e4".into(), is_correct: true, display_order: 2 },
                NormalizedOption { text: "d4".into(), is_correct: false, display_order: 3 },
            ]
        );
    }

    #[test]
    fn option_sets_need_two_entries_and_text() {
        let ApiError::Validation(errors) = validate_options(&options(&[true])).unwrap_err()
        else {
            panic!("expected validation error")
        };
        assert!(errors.contains_key("options"));

        let mut opts = options(&[true, false]);
        opts[1].text = "   ".into();
        let ApiError::Validation(errors) = validate_options(&opts).unwrap_err() else {
            panic!("expected validation error")
        };
        assert!(errors.contains_key("options[1].text"));
    }

    #[test]
    fn question_draft_rules() {
        let d = QuestionDraft {
            quiz_id: Uuid::new_v4(),
            text: "  2+2=?  ".into(),
            question_type: QuestionType::Mcq,
            score: 1,
        };
        assert_eq!(validate_question(&d).unwrap(), "2+2=?");

        let bad = QuestionDraft { text: " ".into(), score: 0, ..d };
        let ApiError::Validation(errors) = validate_question(&bad).unwrap_err() else {
            panic!("expected validation error")
        };
        assert!(errors.contains_key("text"));
        assert!(errors.contains_key("score"));
    }
}
