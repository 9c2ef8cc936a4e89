//! Chromium DevTools commands tunnelled through chromedriver's
//! `goog/cdp/execute` vendor endpoint.

use fantoccini::wd::WebDriverCompatibleCommand;
use http::Method;
use serde_json::json;
use url::{ParseError, Url};

/// `Page.addScriptToEvaluateOnNewDocument`: `source` runs in every new
/// document before any of the page's own scripts.
#[derive(Debug, Clone)]
pub struct AddInitScript {
    source: String,
}

impl AddInitScript {
    /// Wraps `script` in its own function scope so top-level bindings of
    /// separate scripts cannot collide.
    pub fn new(script: &str) -> Self {
        Self {
            source: format!("(() => {{\n{script}\n}})();"),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn body(&self) -> String {
        json!({
            "cmd": "Page.addScriptToEvaluateOnNewDocument",
            "params": { "source": self.source },
        })
        .to_string()
    }
}

impl WebDriverCompatibleCommand for AddInitScript {
    fn endpoint(&self, base_url: &Url, session_id: Option<&str>) -> Result<Url, ParseError> {
        let session = session_id.ok_or(ParseError::EmptyHost)?;
        base_url.join(&format!("session/{session}/goog/cdp/execute"))
    }

    fn method_and_body(&self, _request_url: &Url) -> (Method, Option<String>) {
        (Method::POST, Some(self.body()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_the_session_cdp_endpoint() {
        let cmd = AddInitScript::new("window.x = 1;");
        let base = Url::parse("http://localhost:9515/").unwrap();
        let url = cmd.endpoint(&base, Some("abc")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9515/session/abc/goog/cdp/execute");
        assert!(cmd.endpoint(&base, None).is_err());
    }

    #[test]
    fn body_names_the_devtools_method() {
        let cmd = AddInitScript::new("const a = 1;");
        let (method, body) = cmd.method_and_body(&Url::parse("http://x/").unwrap());
        assert_eq!(method, Method::POST);
        let body: serde_json::Value = serde_json::from_str(&body.unwrap()).unwrap();
        assert_eq!(body["cmd"], "Page.addScriptToEvaluateOnNewDocument");
        let source = body["params"]["source"].as_str().unwrap();
        assert!(source.starts_with("(() => {"));
        assert!(source.contains("const a = 1;"));
    }
}
