use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::Error;

/// Envelope `code` for an application-level failure.
pub const CODE_FAILURE: i32 = 0;
/// Envelope `code` for success.
pub const CODE_SUCCESS: i32 = 1;

/// The `{code, message, data}` wrapper every service response carries.
///
/// A `code == 0` body arrives with HTTP 200, so the HTTP status alone says
/// nothing about the outcome. Convert with [`Envelope::into_result`] as soon as
/// the body is deserialized.
///
/// `data` stays raw JSON until `code` says success: a rejection keeps its
/// message whatever shape its `data` has.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub code: i32,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl Envelope {
    /// Success envelope whose `data` is required.
    ///
    /// # Errors
    ///
    /// [`Error::Rejected`] on `code == 0` (and any other non-success code),
    /// [`Error::Decode`] when a success envelope carries no `data` or `data`
    /// of the wrong shape.
    pub fn into_result<T: DeserializeOwned>(self, operation: &'static str) -> Result<T, Error> {
        self.into_optional(operation)?.ok_or(Error::Decode {
            operation,
            detail: "success envelope without data".into(),
        })
    }

    /// Success envelope whose `data` may be absent (logout, for example).
    ///
    /// # Errors
    ///
    /// [`Error::Rejected`] on any non-success code, [`Error::Decode`] when
    /// present `data` does not fit `T`.
    pub fn into_optional<T: DeserializeOwned>(
        self,
        operation: &'static str,
    ) -> Result<Option<T>, Error> {
        if self.code != CODE_SUCCESS {
            return Err(self.rejection(operation));
        }
        self.data
            .filter(|d| !d.is_null())
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| Error::Decode {
                operation,
                detail: e.to_string(),
            })
    }

    /// The rejection this envelope stands for, with the server message when it sent one.
    pub(crate) fn rejection(self, operation: &'static str) -> Error {
        let message = self
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("{operation} was rejected (code {})", self.code));
        Error::Rejected { operation, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        value: u32,
    }

    fn parse(raw: &str) -> Envelope {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn success_yields_data() {
        let env = parse(r#"{"code":1,"message":"ok","data":{"value":3}}"#);
        assert_eq!(env.into_result::<Payload>("test").unwrap(), Payload { value: 3 });
    }

    #[test]
    fn failure_carries_exact_message() {
        let env = parse(r#"{"code":0,"message":"bad credentials","data":null}"#);
        match env.into_result::<Payload>("login") {
            Err(Error::Rejected { message, operation }) => {
                assert_eq!(message, "bad credentials");
                assert_eq!(operation, "login");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn failure_message_survives_mismatched_data() {
        let env = parse(r#"{"code":0,"message":"Problem not found","data":""}"#);
        let err = env.into_result::<Payload>("problem run").unwrap_err();
        assert!(matches!(err, Error::Rejected { .. }));
        assert_eq!(err.to_string(), "Problem not found");
    }

    #[test]
    fn failure_without_message_gets_fallback() {
        let env = parse(r#"{"code":0}"#);
        let err = env.into_result::<Payload>("playground run").unwrap_err();
        assert_eq!(err.to_string(), "playground run was rejected (code 0)");
    }

    #[test]
    fn success_without_data_is_decode_error() {
        assert!(matches!(
            parse(r#"{"code":1}"#).into_result::<Payload>("problem list"),
            Err(Error::Decode { .. })
        ));
        assert!(matches!(
            parse(r#"{"code":1,"data":null}"#).into_result::<Payload>("problem list"),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn success_with_wrong_shape_is_decode_error() {
        let env = parse(r#"{"code":1,"data":"nope"}"#);
        assert!(matches!(
            env.into_result::<Payload>("problem list"),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn optional_accepts_missing_data() {
        let env = parse(r#"{"code":1,"message":"bye"}"#);
        assert!(env.into_optional::<serde_json::Value>("logout").unwrap().is_none());
    }
}
