use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{PortalConfig, endpoint};
use crate::error::Error;
use crate::transport::read_envelope;
use crate::types::{Credential, Language, ProblemId, ProblemSlug};

/// One entry of the problem set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct ProblemSummary {
    pub id: ProblemId,
    /// Route slug under `/problemset/`.
    pub pathname: ProblemSlug,
    pub name: String,
    pub difficulty: String,
    #[serde(default)]
    pub solved: bool,
}

/// Problem detail plus the starter code for one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct ProblemTemplate {
    pub problem_id: ProblemId,
    pub problem_name: String,
    #[serde(default)]
    pub description: String,
    pub prog_lang: Language,
    pub code_template: String,
}

/// Playground run output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct PlaygroundOutput {
    pub code: i32,
    pub content: String,
}

/// Outcome of one hidden test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct TestCaseResult {
    #[serde(default)]
    pub code: i32,
    pub passed: bool,
    pub input_arguments: String,
    pub expected_result: String,
    pub execution_result: String,
}

impl TestCaseResult {
    /// Input arguments as displayed one per line (space separated on the wire).
    pub fn arguments(&self) -> impl Iterator<Item = &str> {
        self.input_arguments.split(' ').filter(|a| !a.is_empty())
    }
}

/// Graded run of a problem submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct ExecutionResult {
    pub correct_test_cases: usize,
    #[serde(default)]
    pub test_case_results: Vec<TestCaseResult>,
}

impl ExecutionResult {
    /// Overall verdict: every test case counted correct, and there was at least one.
    ///
    /// Driven by the service's `correctTestCases` counter, not the per-case flags.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        !self.test_case_results.is_empty()
            && self.correct_test_cases == self.test_case_results.len()
    }

    /// Per-case recount of `passed` flags.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.test_case_results.iter().filter(|r| r.passed).count()
    }

    /// Whether the counter and the per-case flags agree.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.passed_count() == self.correct_test_cases
    }

    /// Aggregate badge text, e.g. `Correctness: 2/3`.
    #[must_use]
    pub fn correctness_badge(&self) -> String {
        format!(
            "Correctness: {}/{}",
            self.correct_test_cases,
            self.test_case_results.len()
        )
    }
}

/// A single submission. Built fresh each time, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub problem_id: Option<ProblemId>,
    pub language: Language,
    pub source_code: String,
}

impl ExecutionRequest {
    #[must_use]
    pub fn playground(language: Language, source_code: impl Into<String>) -> Self {
        Self {
            problem_id: None,
            language,
            source_code: source_code.into(),
        }
    }

    #[must_use]
    pub fn problem(
        problem_id: ProblemId,
        language: Language,
        source_code: impl Into<String>,
    ) -> Self {
        Self {
            problem_id: Some(problem_id),
            language,
            source_code: source_code.into(),
        }
    }

    /// Multipart body; field names are part of the execution service contract.
    fn form(&self) -> Form {
        let mut form = Form::new();
        if let Some(id) = self.problem_id {
            form = form.text("problemId", id.to_string());
        }
        form.text("progLang", self.language.code())
            .text("codeToExecute", self.source_code.clone())
    }
}

/// Client for the execution service.
///
/// Problem-mode calls attach the bearer credential and report a refused
/// credential as [`Error::Unauthorized`]; callers send the user to login.
#[derive(Debug, Clone)]
pub struct ExecutorClient {
    executor_url: Url,
    http: reqwest::Client,
}

impl ExecutorClient {
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &PortalConfig) -> Result<Self, Error> {
        Ok(Self {
            executor_url: config.executor_url.clone(),
            http: config.http_client()?,
        })
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Run code with no problem identity. Needs no session.
    ///
    /// # Errors
    ///
    /// Transport errors, or [`Error::Rejected`] when the service refuses the run.
    pub async fn run_playground(
        &self,
        language: Language,
        source_code: &str,
    ) -> Result<PlaygroundOutput, Error> {
        let operation = "playground run";
        let request = ExecutionRequest::playground(language, source_code);
        let response = self
            .http
            .post(endpoint(&self.executor_url, &["playground", "run"])?)
            .multipart(request.form())
            .send()
            .await?;

        let output = read_envelope(response, operation)
            .await?
            .into_result(operation)?;
        tracing::debug!(language = %language, "Playground run finished");
        Ok(output)
    }

    /// The problem set, with per-user solved flags.
    ///
    /// # Errors
    ///
    /// [`Error::Unauthorized`] when the credential is refused; transport or
    /// envelope errors otherwise.
    pub async fn list_problems(&self, credential: &Credential) -> Result<Vec<ProblemSummary>, Error> {
        let operation = "problem list";
        let response = self
            .http
            .get(endpoint(&self.executor_url, &["problemset"])?)
            .bearer_auth(credential.as_str())
            .send()
            .await?;

        read_envelope(response, operation)
            .await?
            .into_result(operation)
    }

    /// Problem detail with the starter code for `language`.
    ///
    /// # Errors
    ///
    /// Same as [`list_problems`](Self::list_problems).
    pub async fn problem_template(
        &self,
        slug: &ProblemSlug,
        language: Language,
        credential: &Credential,
    ) -> Result<ProblemTemplate, Error> {
        let operation = "problem template";
        let url = endpoint(
            &self.executor_url,
            &["problemset", slug.as_str(), language.code()],
        )?;
        let response = self
            .http
            .get(url)
            .bearer_auth(credential.as_str())
            .send()
            .await?;

        read_envelope(response, operation)
            .await?
            .into_result(operation)
    }

    /// Grade a submission against the problem's hidden test cases.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] when the request has no problem id (nothing is
    /// sent); otherwise the same as [`list_problems`](Self::list_problems).
    pub async fn run_problem(
        &self,
        request: &ExecutionRequest,
        credential: &Credential,
    ) -> Result<ExecutionResult, Error> {
        let operation = "problem run";
        let problem_id = request
            .problem_id
            .ok_or_else(|| Error::Validation("A problem must be loaded before running".into()))?;

        let response = self
            .http
            .post(endpoint(&self.executor_url, &["problemset", "run"])?)
            .bearer_auth(credential.as_str())
            .multipart(request.form())
            .send()
            .await?;

        let result: ExecutionResult = read_envelope(response, operation)
            .await?
            .into_result(operation)?;

        if !result.is_consistent() {
            tracing::warn!(
                problem_id = %problem_id,
                correct = result.correct_test_cases,
                passed = result.passed_count(),
                "Correct-case counter disagrees with per-case flags"
            );
        }
        tracing::info!(
            problem_id = %problem_id,
            language = %request.language,
            solved = result.is_solved(),
            "Problem run finished"
        );
        Ok(result)
    }
}
