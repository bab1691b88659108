use std::sync::{Mutex, PoisonError};

use crate::error::Error;

const RETRY_LATER: &str = "Internal server error. Please try again later";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeVariant {
    Default,
    Destructive,
}

/// A transient user notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
}

impl Notice {
    #[must_use]
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            title: "Success".into(),
            description: description.into(),
            variant: NoticeVariant::Default,
        }
    }

    #[must_use]
    pub fn error(description: impl Into<String>) -> Self {
        Self {
            title: "Error".into(),
            description: description.into(),
            variant: NoticeVariant::Destructive,
        }
    }

    /// User-facing notice for a failed operation.
    #[must_use]
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::Rejected { message, .. } => Self::error(message.clone()),
            Error::Validation(message) => Self::error(message.clone()),
            Error::Unauthorized { .. } => Self::error("Your session has expired. Please log in again"),
            _ => Self::error(RETRY_LATER),
        }
    }
}

/// Where notices go. The UI layer decides how to show them.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.variant {
            NoticeVariant::Destructive => {
                tracing::warn!(title = %notice.title, description = %notice.description, "notice");
            }
            NoticeVariant::Default => {
                tracing::info!(title = %notice.title, description = %notice.description, "notice");
            }
        }
    }
}

/// Notifier that keeps every notice, for tests and headless callers.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}
