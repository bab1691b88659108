use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Numeric problem identifier assigned by the execution service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct ProblemId(pub i64);

/// Route slug of a problem (`sum-of-numbers` in `/problemset/sum-of-numbers`).
///
/// Guaranteed to be a single non-empty path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(try_from = "String", into = "String")]
pub struct ProblemSlug(String);

impl ProblemSlug {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for ProblemSlug {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for ProblemSlug {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if !s.is_empty() && !s.contains(['/', '?', '#']) {
            Ok(Self(s))
        } else {
            Err(Error::Validation(format!("invalid problem slug: {s:?}")))
        }
    }
}

impl From<ProblemSlug> for String {
    fn from(s: ProblemSlug) -> Self {
        s.0
    }
}

/// Opaque bearer credential issued by the auth service (the `jwt` cookie).
///
/// Never inspected locally. `Debug` is redacted so it stays out of logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, From, Into)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Languages the execution service accepts. Wire names are upper case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Language {
    Java,
    Python,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Java, Language::Python];

    /// Wire name sent as `progLang` and used in template paths.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Java => "JAVA",
            Self::Python => "PYTHON",
        }
    }

    /// Program a fresh playground editor starts with.
    #[must_use]
    pub fn default_program(self) -> &'static str {
        match self {
            Self::Java => {
                "class HelloWorld {\n    public static void main(String[] args) {\n        System.out.println(\"Hello, Java!\"); \n    }\n}"
            }
            Self::Python => "print(\"Hello, Python!\")",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = Error;

    /// Accepts the wire name or the lower-case editor name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "JAVA" => Ok(Self::Java),
            "PYTHON" => Ok(Self::Python),
            "" => Err(Error::Validation(
                "Please select a programming language".into(),
            )),
            other => Err(Error::Validation(format!("unsupported language: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_parses_wire_and_editor_names() {
        assert_eq!("JAVA".parse::<Language>().unwrap(), Language::Java);
        assert_eq!("python".parse::<Language>().unwrap(), Language::Python);
        assert!("rust".parse::<Language>().is_err());
    }

    #[test]
    fn empty_language_asks_for_selection() {
        let err = "".parse::<Language>().unwrap_err();
        assert!(err.to_string().contains("Please select a programming language"));
    }

    #[test]
    fn language_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&Language::Python).unwrap(), "\"PYTHON\"");
        let parsed: Language = serde_json::from_str("\"JAVA\"").unwrap();
        assert_eq!(parsed, Language::Java);
    }

    #[test]
    fn slug_rejects_path_separators() {
        assert!("sum-of-numbers".parse::<ProblemSlug>().is_ok());
        assert!("".parse::<ProblemSlug>().is_err());
        assert!("a/b".parse::<ProblemSlug>().is_err());
        assert!("a?x=1".parse::<ProblemSlug>().is_err());
    }

    #[test]
    fn credential_debug_is_redacted() {
        let credential = Credential::new("secret-token");
        assert_eq!(format!("{credential:?}"), "Credential(<redacted>)");
        assert_eq!(credential.as_str(), "secret-token");
    }

    #[test]
    fn problem_id_is_transparent() {
        let id: ProblemId = serde_json::from_str("7").unwrap();
        assert_eq!(id, ProblemId(7));
        assert_eq!(id.to_string(), "7");
    }
}
