use std::future::{Future, pending};
use std::pin::Pin;
use std::time::Duration;

use quiz_core::model::{Language, ResultSummary, SubmissionResult};
use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at};

use super::service::{TestSession, TickOutcome};
use super::view::SessionView;
use super::workflow::TestSessionService;
use crate::error::{ApiError, SessionError};

/// Countdown resolution.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Periodic snapshot cadence, on top of the saves after each change.
pub const AUTOSAVE_PERIOD: Duration = Duration::from_secs(5);

type SubmissionFuture = Pin<Box<dyn Future<Output = Result<SubmissionResult, ApiError>> + Send>>;

/// Input from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Select { question: usize, option: usize },
    /// Select `option` on the question under the pointer.
    Answer(usize),
    Navigate(usize),
    Next,
    Previous,
    Submit,
    Quit,
}

/// Output for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The session changed; redraw.
    Updated(SessionView),
    /// The countdown reached zero and an automatic submission started.
    TimeUp,
    /// A submission attempt failed; the test can be submitted again.
    SubmitFailed(String),
    /// Terminal. The runner stops after this event.
    Submitted(ResultSummary),
    /// A command was refused; the session is unchanged.
    Rejected(String),
}

/// Drives one `TestSession` from a single task.
///
/// Multiplexes the countdown, the autosave timer, presentation commands and
/// the outstanding submission request, so the student can keep answering
/// while a submit is in flight.
#[derive(Clone)]
pub struct SessionRunner {
    service: TestSessionService,
    language: Language,
}

impl SessionRunner {
    #[must_use]
    pub fn new(service: TestSessionService, language: Language) -> Self {
        Self { service, language }
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    /// Run until the test is submitted, `Quit` arrives, or the command
    /// channel closes. Returns the final session state.
    ///
    /// A session that is not running (loading failed, already submitted) only
    /// publishes its view and returns.
    pub async fn run(
        &self,
        mut session: TestSession,
        mut commands: mpsc::Receiver<SessionCommand>,
        events: mpsc::Sender<SessionEvent>,
    ) -> TestSession {
        self.publish(&events, &session).await;
        if !session.is_running() {
            return session;
        }

        let start = Instant::now();
        let mut ticker = interval_at(start + TICK_PERIOD, TICK_PERIOD);
        let mut autosave = interval_at(start + AUTOSAVE_PERIOD, AUTOSAVE_PERIOD);
        let mut in_flight: Option<SubmissionFuture> = None;

        loop {
            tokio::select! {
                biased;

                outcome = await_submission(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;
                    match self.service.finish_submission(&mut session, outcome).await {
                        Ok(summary) => {
                            emit(&events, SessionEvent::Submitted(summary)).await;
                            break;
                        }
                        Err(err) => {
                            emit(&events, SessionEvent::SubmitFailed(err.to_string())).await;
                            self.publish(&events, &session).await;
                        }
                    }
                }

                command = commands.recv() => {
                    let Some(command) = command else {
                        tracing::debug!("command channel closed");
                        break;
                    };
                    if command == SessionCommand::Quit {
                        break;
                    }
                    if command == SessionCommand::Submit {
                        self.start_submission(&mut session, &mut in_flight, &events).await;
                        continue;
                    }
                    self.apply(&mut session, command, &events).await;
                }

                _ = ticker.tick(), if session.is_running() => {
                    match self.service.tick(&mut session).await {
                        TickOutcome::Idle => {}
                        TickOutcome::Counting(_) => self.publish(&events, &session).await,
                        TickOutcome::Expired => {
                            tracing::info!("time is up; submitting automatically");
                            emit(&events, SessionEvent::TimeUp).await;
                            self.start_submission(&mut session, &mut in_flight, &events).await;
                        }
                    }
                }

                _ = autosave.tick() => {
                    self.service.persist(&session).await;
                }
            }
        }

        // An abandoned in-flight request is dropped here; the saved snapshot
        // stays unsubmitted so the attempt can resume.
        drop(in_flight);
        self.service.persist(&session).await;
        session
    }

    async fn apply(
        &self,
        session: &mut TestSession,
        command: SessionCommand,
        events: &mpsc::Sender<SessionEvent>,
    ) {
        let result = match command {
            SessionCommand::Select { question, option } => {
                self.service.select_answer(session, question, option).await
            }
            SessionCommand::Answer(option) => {
                let question = session.current_index();
                self.service.select_answer(session, question, option).await
            }
            SessionCommand::Navigate(target) => {
                self.service.navigate(session, target).await;
                Ok(())
            }
            SessionCommand::Next => {
                let target = session.current_index().saturating_add(1);
                self.service.navigate(session, target).await;
                Ok(())
            }
            SessionCommand::Previous => {
                let target = session.current_index().saturating_sub(1);
                self.service.navigate(session, target).await;
                Ok(())
            }
            SessionCommand::Submit | SessionCommand::Quit => Ok(()),
        };

        match result {
            Ok(()) => self.publish(events, session).await,
            Err(err) => emit(events, SessionEvent::Rejected(err.to_string())).await,
        }
    }

    async fn start_submission(
        &self,
        session: &mut TestSession,
        in_flight: &mut Option<SubmissionFuture>,
        events: &mpsc::Sender<SessionEvent>,
    ) {
        match self.service.prepare_submission(session).await {
            Ok(pending) => {
                tracing::debug!(answered = pending.answers().answered_count(), "submitting");
                *in_flight = Some(Box::pin(pending.send(self.service.api())));
                self.publish(events, session).await;
            }
            Err(err @ (SessionError::AlreadySubmitted | SessionError::SubmitInFlight)) => {
                emit(events, SessionEvent::Rejected(err.to_string())).await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "submission could not start");
                emit(events, SessionEvent::SubmitFailed(err.to_string())).await;
                self.publish(events, session).await;
            }
        }
    }

    async fn publish(&self, events: &mpsc::Sender<SessionEvent>, session: &TestSession) {
        emit(events, SessionEvent::Updated(SessionView::build(session, self.language))).await;
    }
}

async fn await_submission(
    in_flight: &mut Option<SubmissionFuture>,
) -> Result<SubmissionResult, ApiError> {
    match in_flight.as_mut() {
        Some(request) => request.await,
        None => pending().await,
    }
}

async fn emit(events: &mpsc::Sender<SessionEvent>, event: SessionEvent) {
    if events.send(event).await.is_err() {
        tracing::trace!("event receiver dropped");
    }
}
