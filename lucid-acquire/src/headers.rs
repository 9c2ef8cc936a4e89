use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderName, HeaderValue, UPGRADE_INSECURE_REQUESTS,
    USER_AGENT,
};

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const DEFAULT_ACCEPT_LANGUAGE: &str = "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7";

/// Headers of a top-level navigation in a desktop browser.
///
/// No `Referer` (a typed-in URL has none) and no `Accept-Encoding`, which
/// reqwest negotiates itself.
pub fn browser_headers(user_agent: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    if let Ok(ua) = HeaderValue::from_str(user_agent) {
        h.insert(USER_AGENT, ua);
    }
    h.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    h.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE),
    );
    h.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    for (name, value) in [
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", "none"),
        ("sec-fetch-user", "?1"),
    ] {
        h.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{ACCEPT_ENCODING, REFERER};

    #[test]
    fn navigation_headers_present() {
        let h = browser_headers("Mozilla/5.0 Test");
        assert_eq!(h[USER_AGENT], "Mozilla/5.0 Test");
        assert_eq!(h["sec-fetch-mode"], "navigate");
        assert_eq!(h[UPGRADE_INSECURE_REQUESTS], "1");
        assert!(h.get(REFERER).is_none());
        assert!(h.get(ACCEPT_ENCODING).is_none());
    }
}
