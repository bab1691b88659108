//! Throwaway fake services for client tests.

use std::collections::HashMap;

use url::Url;

/// Serve `router` on an ephemeral local port and return its base URL.
pub(crate) async fn spawn(router: axum::Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}").parse().expect("base url")
}

/// Text fields of a `multipart/form-data` body, by name.
pub(crate) fn multipart_fields(body: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    for part in body.split("\r\n--") {
        let Some((head, value)) = part.split_once("\r\n\r\n") else {
            continue;
        };
        let Some(name) = head
            .split("name=\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
        else {
            continue;
        };
        fields.insert(name.to_string(), value.to_string());
    }
    fields
}
