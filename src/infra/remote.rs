//! Plumbing shared by the reqwest adapters.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::application::sources::RemoteError;

use super::error::InfraError;

/// Longest slice of an error body carried into an error message.
const MAX_ERROR_BODY: usize = 512;

pub(crate) fn user_agent() -> &'static str {
    concat!("fundhub/", env!("CARGO_PKG_VERSION"))
}

pub(crate) fn build_client(timeout: Duration) -> Result<Client, InfraError> {
    Client::builder()
        .user_agent(user_agent())
        .timeout(timeout)
        .build()
        .map_err(|err| InfraError::http_client(err.to_string()))
}

pub(crate) fn parse_base(raw: &str, key: &str) -> Result<Url, InfraError> {
    let url = Url::parse(raw)
        .map_err(|err| InfraError::configuration(format!("{key} `{raw}` is not a URL: {err}")))?;
    if url.cannot_be_a_base() {
        return Err(InfraError::configuration(format!(
            "{key} `{raw}` cannot be used as a base URL"
        )));
    }
    Ok(url)
}

/// `base` with `segments` appended to its path.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, RemoteError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| RemoteError::configuration(format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub(crate) fn transport_error(err: reqwest::Error) -> RemoteError {
    RemoteError::unavailable(err.status().map(|status| status.as_u16()), err.to_string())
}

/// Decode a JSON body, mapping 429 to `RateLimited` and any other non-2xx to
/// `Unavailable`.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(RemoteError::RateLimited);
    }

    let bytes = response.bytes().await.map_err(transport_error)?;
    if !status.is_success() {
        let text = String::from_utf8_lossy(&bytes);
        let text: String = text.chars().take(MAX_ERROR_BODY).collect();
        return Err(RemoteError::unavailable(
            Some(status.as_u16()),
            format!("status {status} body {text}"),
        ));
    }

    serde_json::from_slice(&bytes).map_err(RemoteError::decode)
}
