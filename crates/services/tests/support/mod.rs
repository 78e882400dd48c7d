#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use quiz_core::model::{
    AnswerSet, Question, QuestionDraft, ReviewReport, StudentCredential, StudentProfile,
    SubmissionResult,
};
use quiz_core::time::fixed_clock;
use reqwest::StatusCode;
use services::api::{decode_questions, decode_submission};
use services::{ApiError, QuizApi, TestSessionService};
use storage::repository::{CREDENTIAL_KEY, CredentialRepository, InMemoryRepository};
use tokio::sync::Notify;

pub fn questions(n: usize) -> Vec<Question> {
    (0..n)
        .map(|i| {
            QuestionDraft {
                question_text: Some(format!("Question {}", i + 1)),
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                correct_answer_index: Some(0),
                ..QuestionDraft::default()
            }
            .normalize()
        })
        .collect()
}

pub fn html_error() -> ApiError {
    match decode_questions(StatusCode::OK, "<!DOCTYPE html><html></html>") {
        Err(err) => err,
        Ok(_) => unreachable!("html must not decode"),
    }
}

pub fn token_expired() -> ApiError {
    match decode_submission(StatusCode::UNAUTHORIZED, r#"{"message":"token expired"}"#) {
        Err(err) => err,
        Ok(_) => unreachable!("401 must not decode"),
    }
}

pub fn scored(score: u32, total: u32) -> SubmissionResult {
    SubmissionResult {
        score: Some(score),
        total_questions: Some(total),
        percentage: None,
    }
}

/// Scripted `QuizApi` that counts calls and records submissions.
#[derive(Default)]
pub struct FakeApi {
    questions: Mutex<Option<Result<Vec<Question>, ApiError>>>,
    submit_replies: Mutex<VecDeque<Result<SubmissionResult, ApiError>>>,
    login_reply: Mutex<Option<Result<StudentCredential, ApiError>>>,
    review_reply: Mutex<Option<Result<ReviewReport, ApiError>>>,
    submit_gate: Mutex<Option<Arc<Notify>>>,
    pub fetch_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub submitted: Mutex<Vec<(String, AnswerSet)>>,
}

impl FakeApi {
    pub fn with_questions(n: usize) -> Self {
        let api = Self::default();
        *api.questions.lock().unwrap() = Some(Ok(questions(n)));
        api
    }

    pub fn failing_load(error: ApiError) -> Self {
        let api = Self::default();
        *api.questions.lock().unwrap() = Some(Err(error));
        api
    }

    pub fn push_submit(&self, reply: Result<SubmissionResult, ApiError>) {
        self.submit_replies.lock().unwrap().push_back(reply);
    }

    pub fn set_login(&self, reply: Result<StudentCredential, ApiError>) {
        *self.login_reply.lock().unwrap() = Some(reply);
    }

    pub fn set_review(&self, reply: Result<ReviewReport, ApiError>) {
        *self.review_reply.lock().unwrap() = Some(reply);
    }

    /// Hold every submission until the returned handle is notified.
    pub fn gate_submissions(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.submit_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn submits(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn last_submission(&self) -> Option<(String, AnswerSet)> {
        self.submitted.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl QuizApi for FakeApi {
    async fn fetch_questions(&self) -> Result<Vec<Question>, ApiError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.questions
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn submit_answers(
        &self,
        token: &str,
        answers: &AnswerSet,
    ) -> Result<SubmissionResult, ApiError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted
            .lock()
            .unwrap()
            .push((token.to_string(), answers.clone()));
        let gate = self.submit_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.submit_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(SubmissionResult::default()))
    }

    async fn login(
        &self,
        _roll_number: &str,
        _password: &str,
    ) -> Result<StudentCredential, ApiError> {
        self.login_reply
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(StudentCredential::new("fresh-token")))
    }

    async fn fetch_review(&self, _token: &str) -> Result<ReviewReport, ApiError> {
        self.review_reply
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(ReviewReport::default()))
    }
}

pub fn credential() -> StudentCredential {
    StudentCredential {
        token: "tok-123".into(),
        user: Some(StudentProfile {
            name: Some("Asha".into()),
            roll_number: Some("R-17".into()),
        }),
    }
}

pub async fn signed_in_store() -> InMemoryRepository {
    let store = InMemoryRepository::new();
    store
        .save_credential(CREDENTIAL_KEY, &credential())
        .await
        .unwrap();
    store
}

pub fn service(api: &Arc<FakeApi>, store: &InMemoryRepository) -> TestSessionService {
    let api: Arc<dyn QuizApi> = api.clone();
    TestSessionService::new(
        fixed_clock(),
        api,
        Arc::new(store.clone()),
        Arc::new(store.clone()),
    )
}
