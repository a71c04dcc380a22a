use std::time::Duration;

use reqwest::StatusCode;
use url::Url;

use crate::error::{SyncError, SyncResult};

use super::types::{DailyRecord, FetchErrorBody, RecordPayload};

pub const PAGE_LIMIT: usize = 200;
pub const MAX_PAGES: usize = 100;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

pub fn http_client() -> SyncResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("periodic-para/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| SyncError::Network(e.to_string()))
}

/// Parses the configured endpoint. Only http(s) is accepted.
pub fn parse_endpoint(raw: &str) -> SyncResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| SyncError::Config(format!("invalid dailyRecordAPI '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(SyncError::Config(format!(
            "dailyRecordAPI must be http(s), got {other}"
        ))),
    }
}

/// Endpoint with paging parameters added. Existing query pairs are kept,
/// stale `limit`/`offset` pairs are replaced.
pub fn page_url(endpoint: &Url, offset: usize) -> Url {
    let kept: Vec<(String, String)> = endpoint
        .query_pairs()
        .filter(|(k, _)| k != "limit" && k != "offset")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = endpoint.clone();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair("limit", &PAGE_LIMIT.to_string());
        pairs.append_pair("offset", &offset.to_string());
    }
    url
}

/// Maps a failed response to the error taxonomy.
pub fn error_for_status(status: StatusCode, body: &[u8]) -> SyncError {
    let remote = serde_json::from_slice::<FetchErrorBody>(body).unwrap_or_default();
    let message = remote
        .text()
        .map(str::to_string)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return SyncError::Auth {
            code: status.as_u16(),
            message,
        };
    }
    match remote.code {
        Some(code) => SyncError::Network(format!("http {status} (code {code}): {message}")),
        None => SyncError::Network(format!("http {status}: {message}")),
    }
}

/// Decodes a 2xx body. Some servers answer 200 with an error object.
pub fn decode_page(body: &[u8]) -> SyncResult<Vec<DailyRecord>> {
    match serde_json::from_slice::<RecordPayload>(body) {
        Ok(payload) => Ok(payload.into_records()),
        Err(decode_err) => {
            let remote = serde_json::from_slice::<FetchErrorBody>(body).unwrap_or_default();
            match (remote.code, remote.text()) {
                (Some(code @ (401 | 403)), Some(message)) => Err(SyncError::Auth {
                    code: code as u16,
                    message: message.to_string(),
                }),
                (code, Some(message)) => Err(SyncError::Parse(format!(
                    "remote error{}: {message}",
                    code.map(|c| format!(" {c}")).unwrap_or_default()
                ))),
                (_, None) => Err(SyncError::Parse(decode_err.to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_url_keeps_existing_query_and_replaces_paging() {
        let endpoint =
            parse_endpoint("https://memos.example.com/api/memo?openId=abc&limit=5").expect("url");
        let url = page_url(&endpoint, 400);
        assert_eq!(
            url.as_str(),
            "https://memos.example.com/api/memo?openId=abc&limit=200&offset=400"
        );
    }

    #[test]
    fn rejects_non_http_endpoints() {
        assert!(matches!(parse_endpoint("ftp://x/y"), Err(SyncError::Config(_))));
        assert!(matches!(parse_endpoint("not a url"), Err(SyncError::Config(_))));
    }

    #[test]
    fn unauthorized_maps_to_auth_error_with_remote_message() {
        let err = error_for_status(StatusCode::UNAUTHORIZED, br#"{"code":401,"msg":"expired"}"#);
        match err {
            SyncError::Auth { code, message } => {
                assert_eq!(code, 401);
                assert_eq!(message, "expired");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn server_error_without_body_uses_reason_phrase() {
        let err = error_for_status(StatusCode::BAD_GATEWAY, b"<html>");
        assert!(err.to_string().contains("Bad Gateway"));
    }

    #[test]
    fn error_object_in_success_body_is_reported() {
        let err = decode_page(br#"{"code":500,"error":"db locked"}"#).expect_err("error body");
        assert!(err.to_string().contains("db locked"));

        let err = decode_page(br#"{"code":403,"message":"no access"}"#).expect_err("auth body");
        assert!(matches!(err, SyncError::Auth { code: 403, .. }));

        assert!(matches!(decode_page(b"nonsense"), Err(SyncError::Parse(_))));
    }
}
