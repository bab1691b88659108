use reqwest::StatusCode;

use crate::envelope::Envelope;
use crate::error::Error;

fn is_refusal(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

/// Checks HTTP status and decodes the envelope.
///
/// 401/403 become [`Error::Unauthorized`], any other non-2xx becomes
/// [`Error::Status`]. The envelope `code` is left for the caller.
pub(crate) async fn read_envelope(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<Envelope, Error> {
    let status = response.status();
    if is_refusal(status) {
        tracing::warn!(operation, status = status.as_u16(), "Credential refused");
        return Err(Error::Unauthorized { operation });
    }
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        return Err(Error::Status {
            operation,
            status: status.as_u16(),
            detail,
        });
    }

    let body = response.bytes().await?;
    decode(&body, operation)
}

/// [`read_envelope`] for endpoints that judge submitted credentials.
///
/// There a 401/403 answers the input, not the session: it becomes
/// [`Error::Rejected`] carrying the envelope message when the body has one.
pub(crate) async fn read_login_envelope(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<Envelope, Error> {
    let status = response.status();
    if !is_refusal(status) {
        return read_envelope(response, operation).await;
    }

    let body = response.bytes().await?;
    let err = match decode(&body, operation) {
        Ok(envelope) if envelope.message.as_deref().is_some_and(|m| !m.is_empty()) => {
            envelope.rejection(operation)
        }
        _ => Error::Rejected {
            operation,
            message: format!("{operation} was refused (HTTP {})", status.as_u16()),
        },
    };
    tracing::debug!(operation, status = status.as_u16(), "Credentials refused");
    Err(err)
}

fn decode(body: &[u8], operation: &'static str) -> Result<Envelope, Error> {
    serde_json::from_slice(body).map_err(|e| Error::Decode {
        operation,
        detail: e.to_string(),
    })
}
