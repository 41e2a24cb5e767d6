//! Bearer token extraction (§4.C step 4): `Authorization: (Splunk|Bearer|Telhawk)
//! <token>` with a case-insensitive scheme.

use axum::http::HeaderMap;

const SCHEMES: [&str; 3] = ["splunk", "bearer", "telhawk"];

/// Extract the bearer token from `Authorization`, if the scheme matches one
/// of the accepted forms.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.splitn(2, ' ');
    let scheme = parts.next()?;
    let token = parts.next()?.trim();
    if token.is_empty() {
        return None;
    }
    if SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) {
        Some(token.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn accepts_splunk_scheme_case_insensitive() {
        assert_eq!(extract_token(&headers_with("Splunk abc123")), Some("abc123".to_string()));
        assert_eq!(extract_token(&headers_with("SPLUNK abc123")), Some("abc123".to_string()));
    }

    #[test]
    fn accepts_bearer_and_telhawk_schemes() {
        assert_eq!(extract_token(&headers_with("Bearer xyz")), Some("xyz".to_string()));
        assert_eq!(extract_token(&headers_with("Telhawk xyz")), Some("xyz".to_string()));
    }

    #[test]
    fn rejects_unknown_scheme() {
        assert_eq!(extract_token(&headers_with("Basic xyz")), None);
    }

    #[test]
    fn rejects_missing_header() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
    }

    #[test]
    fn rejects_empty_token() {
        assert_eq!(extract_token(&headers_with("Bearer ")), None);
    }
}
