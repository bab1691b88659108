#![doc = include_str!("../README.md")]

pub mod config;
pub mod envelope;
pub mod error;
pub mod notify;
pub mod session;
pub mod types;

#[cfg(feature = "client")]
pub mod auth;
#[cfg(feature = "client")]
pub mod executor;
#[cfg(feature = "client")]
pub mod oauth;
#[cfg(feature = "client")]
pub mod submission;
#[cfg(feature = "client")]
mod transport;

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(test)]
mod test_support;

// Re-exports for convenient access
pub use config::PortalConfig;
pub use envelope::Envelope;
pub use error::Error;
pub use notify::{Notice, NoticeVariant, Notifier, RecordingNotifier, TracingNotifier};
pub use session::{FileStorage, MemoryStorage, SessionStatus, SessionStorage, SessionStore};
pub use types::{Credential, Language, ProblemId, ProblemSlug};

#[cfg(feature = "client")]
pub use auth::{AuthClient, LoginOutcome, Navigation};
#[cfg(feature = "client")]
pub use executor::{
    ExecutionRequest, ExecutionResult, ExecutorClient, PlaygroundOutput, ProblemSummary,
    ProblemTemplate, TestCaseResult,
};
#[cfg(feature = "client")]
pub use oauth::{OAuthCallback, OAuthLogin, OAuthProvider, authorization_url};
#[cfg(feature = "client")]
pub use submission::{PlaygroundRunner, ProblemRunner, SubmissionPhase, SubmitGate, SubmitPermit};
