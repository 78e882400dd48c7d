//! Response decoding shared by every endpoint.
//!
//! Bodies are read as text first so an HTML page from a misconfigured base
//! URL is reported as an invalid response instead of a JSON parse failure.

use quiz_core::model::{
    Question, QuestionDraft, ReviewReport, StudentCredential, SubmissionResult,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

// JSON never starts with `<`; `<!DOCTYPE`, `<html>` and XML error pages all do.
fn looks_like_html(body: &str) -> bool {
    body.trim_start().starts_with('<')
}

fn parse_json(body: &str) -> Result<Value, ApiError> {
    if looks_like_html(body) {
        return Err(ApiError::InvalidResponse(
            "backend returned HTML; check the API base url".into(),
        ));
    }
    serde_json::from_str(body)
        .map_err(|err| ApiError::InvalidResponse(format!("response is not JSON: {err}")))
}

fn server_message(value: &Value) -> Option<String> {
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|msg| !msg.is_empty())
        .map(str::to_string)
}

/// Parse the body and turn a non-success status into `ApiError::Rejected`.
fn checked(status: StatusCode, body: &str, fallback: &str) -> Result<Value, ApiError> {
    let value = parse_json(body)?;
    if !status.is_success() {
        return Err(ApiError::Rejected {
            status,
            message: server_message(&value).unwrap_or_else(|| fallback.to_string()),
        });
    }
    Ok(value)
}

fn from_value<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, ApiError> {
    serde_json::from_value(value)
        .map_err(|err| ApiError::InvalidResponse(format!("malformed {what}: {err}")))
}

/// Decode `GET /api/student/questions`.
///
/// # Errors
///
/// `InvalidResponse` for HTML, non-JSON, or a body that is not a question list;
/// `Rejected` for a non-success status.
pub fn decode_questions(status: StatusCode, body: &str) -> Result<Vec<Question>, ApiError> {
    let value = checked(status, body, "failed to load questions")?;
    if !value.is_array() {
        return Err(ApiError::InvalidResponse("expected a list of questions".into()));
    }
    let drafts: Vec<QuestionDraft> = from_value(value, "question list")?;
    Ok(drafts.into_iter().map(QuestionDraft::normalize).collect())
}

/// Decode `POST /api/student/submit`.
///
/// Score fields are read leniently; a success body without them, or one that
/// is not an object, yields an empty `SubmissionResult`.
///
/// # Errors
///
/// `InvalidResponse` for HTML or non-JSON; `Rejected` for a non-success status.
pub fn decode_submission(status: StatusCode, body: &str) -> Result<SubmissionResult, ApiError> {
    let value = checked(status, body, "submission failed")?;
    if !value.is_object() {
        return Ok(SubmissionResult::default());
    }
    from_value(value, "submission result")
}

/// Decode `POST /api/auth/login`.
///
/// # Errors
///
/// `InvalidResponse` for HTML, non-JSON, or a body without a token;
/// `Rejected` for a non-success status.
pub fn decode_credential(status: StatusCode, body: &str) -> Result<StudentCredential, ApiError> {
    let value = checked(status, body, "invalid login credentials")?;
    from_value(value, "login response")
}

/// Decode `GET /api/student/review`.
///
/// # Errors
///
/// `InvalidResponse` for HTML or non-JSON; `Rejected` for a non-success status.
pub fn decode_review(status: StatusCode, body: &str) -> Result<ReviewReport, ApiError> {
    let value = checked(status, body, "failed to load review")?;
    from_value(value, "review")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_question_response_is_invalid_response() {
        let body = "<!DOCTYPE html><html><body>Cannot GET</body></html>";
        let err = decode_questions(StatusCode::OK, body).unwrap_err();
        assert!(err.is_invalid_response());

        let err = decode_questions(StatusCode::NOT_FOUND, "  <html></html>").unwrap_err();
        assert!(err.is_invalid_response());
    }

    #[test]
    fn non_array_question_body_is_invalid() {
        let err = decode_questions(StatusCode::OK, r#"{"questions":[]}"#).unwrap_err();
        assert!(err.is_invalid_response());
        let err = decode_questions(StatusCode::OK, "plain text").unwrap_err();
        assert!(err.is_invalid_response());
    }

    #[test]
    fn questions_are_normalized() {
        let body = r#"[
            {"_id":"a","questionText":"Q1","options":["x","y"],"correctAnswer":" y "},
            {"_id":"b","questionText":"Q2","options":["p","q"],"correctAnswerIndex":0},
            {"_id":"c","questionText":"Q3","options":["m"]}
        ]"#;
        let questions = decode_questions(StatusCode::OK, body).unwrap();
        let indices: Vec<_> = questions.iter().map(Question::correct_index).collect();
        assert_eq!(indices, vec![Some(1), Some(0), None]);
    }

    #[test]
    fn empty_question_list_is_fine() {
        assert!(decode_questions(StatusCode::OK, "[]").unwrap().is_empty());
    }

    #[test]
    fn rejected_submission_carries_server_message() {
        let err =
            decode_submission(StatusCode::UNAUTHORIZED, r#"{"message":"token expired"}"#)
                .unwrap_err();
        match err {
            ApiError::Rejected { status, message } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(message, "token expired");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejected_without_message_uses_fallback() {
        let err = decode_submission(StatusCode::INTERNAL_SERVER_ERROR, "{}").unwrap_err();
        assert_eq!(err.to_string(), "submission failed");
    }

    #[test]
    fn submission_tolerates_missing_score() {
        let result = decode_submission(StatusCode::OK, r#"{"message":"saved"}"#).unwrap();
        assert_eq!(result, SubmissionResult::default());

        let result = decode_submission(
            StatusCode::OK,
            r#"{"score":4.0,"totalQuestions":5,"percentage":80}"#,
        )
        .unwrap();
        assert_eq!(result.score, Some(4));
        assert_eq!(result.total_questions, Some(5));
        assert_eq!(result.percentage, Some(80.0));

        let result =
            decode_submission(StatusCode::OK, r#"{"score":"four","totalQuestions":5}"#).unwrap();
        assert_eq!(result.score, None);
        assert_eq!(result.total_questions, Some(5));
    }

    #[test]
    fn login_requires_token() {
        let cred = decode_credential(
            StatusCode::OK,
            r#"{"token":"t","user":{"name":"N","rollNumber":"R"}}"#,
        )
        .unwrap();
        assert_eq!(cred.token, "t");

        let err = decode_credential(StatusCode::OK, r#"{"user":{}}"#).unwrap_err();
        assert!(err.is_invalid_response());

        let err = decode_credential(StatusCode::BAD_REQUEST, r#"{}"#).unwrap_err();
        assert_eq!(err.to_string(), "invalid login credentials");
    }

    #[test]
    fn review_decodes() {
        let report = decode_review(
            StatusCode::OK,
            r#"{"score":1,"totalQuestions":2,"percentage":50,"review":[]}"#,
        )
        .unwrap();
        assert_eq!(report.total_questions, Some(2));
        assert!(report.is_empty());
    }
}
