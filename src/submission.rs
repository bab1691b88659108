//! Submission lifecycle for the playground and the problem runner.
//!
//! Each runner moves `Idle -> Submitting -> {ResultReady | ErrorShown}` and
//! holds a [`SubmitGate`] so only one submission is in flight at a time. The
//! gate re-enables the trigger when its permit drops, on every path out of
//! `Submitting`.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::Error;
use crate::executor::{
    ExecutionRequest, ExecutionResult, ExecutorClient, PlaygroundOutput, ProblemTemplate,
};
use crate::notify::{Notice, Notifier};
use crate::types::{Credential, Language, ProblemId, ProblemSlug};

/// Where a runner is in its submit cycle.
///
/// `ResultReady` and `ErrorShown` are idle states that keep the last outcome
/// on screen; only `Submitting` holds the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Submitting,
    ResultReady,
    ErrorShown,
}

impl SubmissionPhase {
    /// True whenever no submission is in flight.
    #[must_use]
    pub fn is_idle(self) -> bool {
        !matches!(self, Self::Submitting)
    }
}

/// Single-flight guard for a submit trigger.
#[derive(Debug, Default)]
pub struct SubmitGate {
    in_flight: AtomicBool,
    completed: AtomicUsize,
}

impl SubmitGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable the trigger. `None` while another submission holds it.
    pub fn try_begin(&self) -> Option<SubmitPermit<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmitPermit { gate: self })
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.in_flight.load(Ordering::Acquire)
    }

    /// How many submissions have released the trigger so far.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }
}

/// Held for the duration of one submission; dropping it re-enables the trigger.
#[derive(Debug)]
pub struct SubmitPermit<'a> {
    gate: &'a SubmitGate,
}

impl Drop for SubmitPermit<'_> {
    fn drop(&mut self) {
        self.gate.completed.fetch_add(1, Ordering::AcqRel);
        self.gate.in_flight.store(false, Ordering::Release);
    }
}

fn busy() -> Error {
    Error::Validation("A submission is already running".into())
}

fn no_language() -> Error {
    Error::Validation("Please select a programming language".into())
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Problem runner ─────────────────────────────────────────────────

struct ProblemState {
    problem_id: ProblemId,
    problem_name: String,
    description: String,
    language: Option<Language>,
    template: String,
    source: String,
    result: Option<ExecutionResult>,
    phase: SubmissionPhase,
    /// Bumped by every language switch; a fetch applies only if still current.
    selection: u64,
}

impl ProblemState {
    /// Swap in a fresh template. Returns the editor text if it had been edited.
    fn apply_template(&mut self, language: Language, template: ProblemTemplate) -> Option<String> {
        let edited = self.source != self.template;
        let previous = std::mem::replace(&mut self.source, template.code_template.clone());
        self.template = template.code_template;
        self.problem_id = template.problem_id;
        self.problem_name = template.problem_name;
        self.description = template.description;
        self.language = Some(language);
        edited.then_some(previous)
    }
}

/// Graded runner for one problem page.
pub struct ProblemRunner {
    executor: Arc<ExecutorClient>,
    notifier: Arc<dyn Notifier>,
    credential: Credential,
    slug: ProblemSlug,
    gate: SubmitGate,
    state: Mutex<ProblemState>,
}

impl ProblemRunner {
    /// Language a freshly opened problem starts with.
    pub const DEFAULT_LANGUAGE: Language = Language::Python;

    /// Fetch the problem and its starter code for [`DEFAULT_LANGUAGE`](Self::DEFAULT_LANGUAGE).
    ///
    /// # Errors
    ///
    /// Whatever the template fetch returns; [`Error::Unauthorized`] means the
    /// caller should send the user to login.
    pub async fn open(
        executor: Arc<ExecutorClient>,
        notifier: Arc<dyn Notifier>,
        slug: ProblemSlug,
        credential: Credential,
    ) -> Result<Self, Error> {
        let template = executor
            .problem_template(&slug, Self::DEFAULT_LANGUAGE, &credential)
            .await?;

        Ok(Self {
            executor,
            notifier,
            credential,
            slug,
            gate: SubmitGate::new(),
            state: Mutex::new(ProblemState {
                problem_id: template.problem_id,
                problem_name: template.problem_name,
                description: template.description,
                language: Some(Self::DEFAULT_LANGUAGE),
                template: template.code_template.clone(),
                source: template.code_template,
                result: None,
                phase: SubmissionPhase::Idle,
                selection: 0,
            }),
        })
    }

    #[must_use]
    pub fn slug(&self) -> &ProblemSlug {
        &self.slug
    }

    #[must_use]
    pub fn problem_id(&self) -> ProblemId {
        lock(&self.state).problem_id
    }

    #[must_use]
    pub fn problem_name(&self) -> String {
        lock(&self.state).problem_name.clone()
    }

    #[must_use]
    pub fn description(&self) -> String {
        lock(&self.state).description.clone()
    }

    #[must_use]
    pub fn language(&self) -> Option<Language> {
        lock(&self.state).language
    }

    #[must_use]
    pub fn source(&self) -> String {
        lock(&self.state).source.clone()
    }

    #[must_use]
    pub fn result(&self) -> Option<ExecutionResult> {
        lock(&self.state).result.clone()
    }

    #[must_use]
    pub fn phase(&self) -> SubmissionPhase {
        lock(&self.state).phase
    }

    #[must_use]
    pub fn is_submit_enabled(&self) -> bool {
        self.gate.is_enabled()
    }

    #[must_use]
    pub fn gate(&self) -> &SubmitGate {
        &self.gate
    }

    /// Editor change.
    pub fn set_source(&self, source: impl Into<String>) {
        lock(&self.state).source = source.into();
    }

    /// Empty the editor.
    pub fn clear(&self) {
        lock(&self.state).source.clear();
    }

    /// Deselect the language. The next submit fails validation.
    pub fn unselect_language(&self) {
        lock(&self.state).language = None;
    }

    /// Switch language: fetch that language's template and replace the editor.
    ///
    /// Returns the edits that were thrown away, if the editor no longer held
    /// the pristine template. Overlapping switches resolve to the last one
    /// requested: a switch superseded while its fetch was pending changes
    /// nothing and returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// The template fetch error; the editor and language are left as they were.
    pub async fn select_language(&self, language: Language) -> Result<Option<String>, Error> {
        let selection = {
            let mut state = lock(&self.state);
            state.selection += 1;
            state.selection
        };

        let fetched = self
            .executor
            .problem_template(&self.slug, language, &self.credential)
            .await;

        let mut state = lock(&self.state);
        if state.selection != selection {
            tracing::debug!(slug = %self.slug, language = %language, "Language switch superseded");
            return Ok(None);
        }
        match fetched {
            Ok(template) => {
                let discarded = state.apply_template(language, template);
                if discarded.is_some() {
                    tracing::debug!(slug = %self.slug, language = %language, "Discarded unsaved edits on language switch");
                }
                Ok(discarded)
            }
            Err(e) => {
                drop(state);
                self.notifier.notify(Notice::from_error(&e));
                Err(e)
            }
        }
    }

    /// Grade the editor contents.
    ///
    /// # Errors
    ///
    /// Validation (no language, or a submission already running), or the
    /// execution error. Every failure except "already running" is also sent
    /// to the notifier.
    pub async fn submit(&self) -> Result<ExecutionResult, Error> {
        let Some(_permit) = self.gate.try_begin() else {
            return Err(busy());
        };

        let request = {
            let mut state = lock(&self.state);
            let Some(language) = state.language else {
                state.phase = SubmissionPhase::ErrorShown;
                drop(state);
                let err = no_language();
                self.notifier.notify(Notice::from_error(&err));
                return Err(err);
            };
            state.phase = SubmissionPhase::Submitting;
            state.result = None;
            ExecutionRequest::problem(state.problem_id, language, state.source.clone())
        };

        let outcome = self.executor.run_problem(&request, &self.credential).await;

        let mut state = lock(&self.state);
        match outcome {
            Ok(result) => {
                state.phase = SubmissionPhase::ResultReady;
                state.result = Some(result.clone());
                Ok(result)
            }
            Err(e) => {
                state.phase = SubmissionPhase::ErrorShown;
                drop(state);
                self.notifier.notify(Notice::from_error(&e));
                Err(e)
            }
        }
    }
}

// ── Playground runner ──────────────────────────────────────────────

struct PlaygroundState {
    language: Option<Language>,
    source: String,
    output: Option<PlaygroundOutput>,
    phase: SubmissionPhase,
}

/// Playground execution. Needs no login and saves nothing.
pub struct PlaygroundRunner {
    executor: Arc<ExecutorClient>,
    notifier: Arc<dyn Notifier>,
    gate: SubmitGate,
    state: Mutex<PlaygroundState>,
}

impl PlaygroundRunner {
    /// Starts with no language selected and an empty editor.
    #[must_use]
    pub fn new(executor: Arc<ExecutorClient>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            executor,
            notifier,
            gate: SubmitGate::new(),
            state: Mutex::new(PlaygroundState {
                language: None,
                source: String::new(),
                output: None,
                phase: SubmissionPhase::Idle,
            }),
        }
    }

    /// Load the language's default program and clear the last output.
    pub fn select_language(&self, language: Language) {
        let mut state = lock(&self.state);
        state.language = Some(language);
        state.source = language.default_program().to_string();
        state.output = None;
    }

    pub fn set_source(&self, source: impl Into<String>) {
        lock(&self.state).source = source.into();
    }

    pub fn clear(&self) {
        lock(&self.state).source.clear();
    }

    #[must_use]
    pub fn language(&self) -> Option<Language> {
        lock(&self.state).language
    }

    #[must_use]
    pub fn source(&self) -> String {
        lock(&self.state).source.clone()
    }

    #[must_use]
    pub fn output(&self) -> Option<PlaygroundOutput> {
        lock(&self.state).output.clone()
    }

    #[must_use]
    pub fn phase(&self) -> SubmissionPhase {
        lock(&self.state).phase
    }

    #[must_use]
    pub fn is_submit_enabled(&self) -> bool {
        self.gate.is_enabled()
    }

    #[must_use]
    pub fn gate(&self) -> &SubmitGate {
        &self.gate
    }

    /// Run the editor contents.
    ///
    /// # Errors
    ///
    /// Same contract as [`ProblemRunner::submit`].
    pub async fn submit(&self) -> Result<PlaygroundOutput, Error> {
        let Some(_permit) = self.gate.try_begin() else {
            return Err(busy());
        };

        let (language, source) = {
            let mut state = lock(&self.state);
            let Some(language) = state.language else {
                state.phase = SubmissionPhase::ErrorShown;
                drop(state);
                let err = no_language();
                self.notifier.notify(Notice::from_error(&err));
                return Err(err);
            };
            state.phase = SubmissionPhase::Submitting;
            (language, state.source.clone())
        };

        let outcome = self.executor.run_playground(language, &source).await;

        let mut state = lock(&self.state);
        match outcome {
            Ok(output) => {
                state.phase = SubmissionPhase::ResultReady;
                state.output = Some(output.clone());
                drop(state);
                self.notifier
                    .notify(Notice::success("Code executed successfully"));
                Ok(output)
            }
            Err(e) => {
                state.phase = SubmissionPhase::ErrorShown;
                drop(state);
                self.notifier.notify(Notice::from_error(&e));
                Err(e)
            }
        }
    }
}
