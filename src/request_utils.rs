//! Request payload helpers.
//!
//! Text utilities the dispatcher applies once a payload has been fetched:
//! long string resolution for header lists, image data URIs, headers
//! embedded in multipart bodies, and urlencoded form sections.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use futures_util::future::try_join_all;
use regex::Regex;

use crate::error::Result;
use crate::host::HostClient;
use crate::protocol::{
    Cookie, CookiePayload, Header, HeaderCollection, LongString, PostDataPayload,
};

// ============================================================================
// Constants
// ============================================================================

/// Line breaks inside a form body.
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\r|\n").expect("valid line break pattern"));

/// Folded header continuation line.
static CONTINUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+").expect("valid continuation pattern"));

/// Separator between the embedded header block and the body.
const HEADER_BLOCK_END: &str = "\r\n\r\n";

// ============================================================================
// Headers
// ============================================================================

/// Resolves every header value of `collection` to literal text.
///
/// All values are resolved concurrently; the first failure fails the whole
/// collection.
pub async fn fetch_headers(
    collection: HeaderCollection,
    host: &dyn HostClient,
) -> Result<HeaderCollection> {
    if collection.is_resolved() {
        return Ok(collection);
    }

    let values = try_join_all(
        collection
            .headers
            .iter()
            .map(|header| host.resolve_long_string(&header.value)),
    )
    .await?;

    let headers = collection
        .headers
        .into_iter()
        .zip(values)
        .map(|(header, value)| Header::new(header.name, value))
        .collect();

    Ok(HeaderCollection {
        headers,
        ..collection
    })
}

// ============================================================================
// Cookies
// ============================================================================

/// Normalizes a cookie payload and resolves every cookie value.
///
/// Returns `None` when the payload is not a cookie list.
pub async fn fetch_cookies(
    payload: CookiePayload,
    host: &dyn HostClient,
) -> Result<Option<Vec<Cookie>>> {
    let Some(cookies) = payload.into_cookies() else {
        return Ok(None);
    };

    let values = try_join_all(
        cookies
            .iter()
            .map(|cookie| host.resolve_long_string(&cookie.value)),
    )
    .await?;

    let cookies = cookies
        .into_iter()
        .zip(values)
        .map(|(cookie, value)| Cookie {
            value: value.into(),
            ..cookie
        })
        .collect();

    Ok(Some(cookies))
}

// ============================================================================
// Multipart Bodies
// ============================================================================

/// Extracts the headers embedded at the top of a multipart body.
///
/// Only the block before the first blank line is scanned. A body that
/// starts with a boundary (`---`) has no headers. Lines without a colon are
/// skipped; folded lines become extra headers under the previous name.
#[must_use]
pub fn headers_from_multipart_text(text: &str) -> Vec<Header> {
    let mut headers = Vec::new();
    if text.is_empty() || text.starts_with("---") {
        return headers;
    }

    let Some(end) = text.find(HEADER_BLOCK_END) else {
        return headers;
    };

    let mut last_name: Option<String> = None;
    for line in text[..end].split("\r\n") {
        if let Some(name) = &last_name
            && CONTINUATION.is_match(line)
        {
            headers.push(Header::new(name.clone(), line.trim()));
            continue;
        }

        let Some((name, value)) = line.split_once(':') else {
            continue;
        };

        let name = name.trim().to_string();
        headers.push(Header::new(name.clone(), value.trim()));
        last_name = Some(name);
    }

    headers
}

/// Aggregate size of a header list: name, value and two bytes per header.
#[must_use]
pub fn upload_headers_size(headers: &[Header]) -> u64 {
    headers
        .iter()
        .map(|header| {
            let value = header.value.as_literal().map_or(0, str::len);
            (header.name.len() + value + 2) as u64
        })
        .sum()
}

// ============================================================================
// Bodies
// ============================================================================

/// Builds a `data:` URI for a response body.
///
/// Without an encoding the text is base64-encoded and labelled as such.
#[must_use]
pub fn form_data_uri(mime_type: &str, encoding: Option<&str>, text: &str) -> String {
    match encoding {
        Some(encoding) if !encoding.is_empty() => format!("data:{mime_type};{encoding},{text}"),
        _ => format!(
            "data:{mime_type};base64,{}",
            Base64Standard.encode(text.as_bytes())
        ),
    }
}

/// Splits a urlencoded POST body into its form sections.
///
/// The content type is looked up in the upload stream headers first, then
/// in the request headers. Bodies of any other type have no sections. Lines
/// that start with an upload stream header name are left out.
pub async fn form_data_sections(
    request_headers: &HeaderCollection,
    upload_headers: &HeaderCollection,
    post_data: &PostDataPayload,
    host: &dyn HostClient,
) -> Result<Vec<String>> {
    let content_type = upload_headers
        .headers
        .iter()
        .chain(&request_headers.headers)
        .find(|header| header.name.eq_ignore_ascii_case("content-type"))
        .map_or_else(LongString::default, |header| header.value.clone());

    let content_type = host.resolve_long_string(&content_type).await?;
    if !content_type.contains("x-www-form-urlencoded") {
        return Ok(Vec::new());
    }

    let text = host.resolve_long_string(&post_data.post_data.text).await?;
    let sections = LINE_BREAK
        .split(&text)
        .filter(|section| {
            upload_headers
                .headers
                .iter()
                .all(|header| !section.starts_with(header.name.as_str()))
        })
        .map(str::to_string)
        .collect();

    Ok(sections)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::host::memory::MemoryHost;
    use crate::protocol::PostData;

    fn post(text: impl Into<LongString>) -> PostDataPayload {
        PostDataPayload {
            post_data: PostData { text: text.into() },
            post_data_discarded: false,
        }
    }

    #[test]
    fn test_multipart_header_size() {
        let headers =
            headers_from_multipart_text("Content-Disposition: form-data; name=\"a\"\r\n\r\n");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].name, "Content-Disposition");
        assert_eq!(headers[0].value.as_literal(), Some("form-data; name=\"a\""));
        assert_eq!(upload_headers_size(&headers), 19 + 19 + 2);
    }

    #[test]
    fn test_multipart_continuation_and_junk_lines() {
        let text = "Content-Type: text/plain\r\n\tcharset=utf-8\r\nno colon here\r\nX-A: 1\r\n\r\nbody: not a header";
        let headers = headers_from_multipart_text(text);

        let pairs: Vec<_> = headers
            .iter()
            .map(|h| (h.name.as_str(), h.value.as_literal().unwrap_or_default()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Content-Type", "text/plain"),
                ("Content-Type", "charset=utf-8"),
                ("X-A", "1"),
            ]
        );
    }

    #[test]
    fn test_multipart_without_headers() {
        assert!(headers_from_multipart_text("").is_empty());
        assert!(headers_from_multipart_text("-----boundary\r\n\r\n").is_empty());
        assert!(headers_from_multipart_text("a=1&b=2").is_empty());
    }

    #[tokio::test]
    async fn test_fetch_cookies_shapes() {
        let host = MemoryHost::new();
        let grip = host.add_long_string("x".repeat(3000));

        let wrapped: CookiePayload = serde_json::from_value(serde_json::json!({
            "cookies": [{ "name": "sid", "value": grip, "path": "/" }]
        }))
        .expect("parse");
        let cookies = fetch_cookies(wrapped, &host)
            .await
            .expect("resolve")
            .expect("cookie list");
        assert_eq!(cookies[0].value.as_literal().map(str::len), Some(3000));
        assert_eq!(cookies[0].attributes["path"], "/");

        let bare: CookiePayload =
            serde_json::from_value(serde_json::json!([{ "name": "a", "value": "1" }]))
                .expect("parse");
        let cookies = fetch_cookies(bare, &host).await.expect("resolve");
        assert_eq!(cookies.map(|c| c.len()), Some(1));

        let other: CookiePayload =
            serde_json::from_value(serde_json::json!({ "from": "netEvent1" })).expect("parse");
        assert_eq!(fetch_cookies(other, &host).await.expect("resolve"), None);
    }

    #[test]
    fn test_form_data_uri() {
        assert_eq!(
            form_data_uri("image/png", Some("base64"), "iVBORw0KGgo="),
            "data:image/png;base64,iVBORw0KGgo="
        );
        assert_eq!(
            form_data_uri("image/svg+xml", None, "<svg/>"),
            "data:image/svg+xml;base64,PHN2Zy8+"
        );
    }

    #[tokio::test]
    async fn test_fetch_headers_resolves_references() {
        let host = MemoryHost::new();
        let grip = host.add_long_string("a".repeat(5000));

        let collection = HeaderCollection::new(
            vec![Header::new("Cookie", grip), Header::new("Accept", "*/*")],
            42,
        );
        let resolved = fetch_headers(collection, &host).await.expect("resolve");

        assert!(resolved.is_resolved());
        assert_eq!(resolved.headers_size, 42);
        assert_eq!(resolved.headers[0].value.as_literal().map(str::len), Some(5000));
        assert_eq!(resolved.headers[1].value.as_literal(), Some("*/*"));
    }

    #[tokio::test]
    async fn test_fetch_headers_fails_on_unknown_grip() {
        let host = MemoryHost::new();
        let collection = HeaderCollection::new(
            vec![Header::new(
                "Cookie",
                crate::protocol::LongStringGrip::new("conn0.gone", 5000, "a"),
            )],
            0,
        );
        assert!(fetch_headers(collection, &host).await.is_err());
    }

    #[tokio::test]
    async fn test_form_data_sections_urlencoded() {
        let host = MemoryHost::new();
        let request_headers = HeaderCollection::new(
            vec![Header::new(
                "Content-Type",
                "application/x-www-form-urlencoded",
            )],
            0,
        );
        let upload = HeaderCollection::new(vec![Header::new("Content-Length", "7")], 0);
        let body = post("Content-Length: 7\r\n\r\na=1&b=2\nc=3");

        let sections = form_data_sections(&request_headers, &upload, &body, &host)
            .await
            .expect("sections");
        assert_eq!(sections, vec!["", "a=1&b=2", "c=3"]);
    }

    #[tokio::test]
    async fn test_form_data_sections_other_type() {
        let host = MemoryHost::new();
        let request_headers =
            HeaderCollection::new(vec![Header::new("content-type", "application/json")], 0);
        let upload = HeaderCollection::new(Vec::new(), 0);

        let sections = form_data_sections(&request_headers, &upload, &post("{}"), &host)
            .await
            .expect("sections");
        assert!(sections.is_empty());
    }
}
