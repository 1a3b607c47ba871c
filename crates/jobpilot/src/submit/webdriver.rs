//! Minimal W3C WebDriver client.
//!
//! Speaks the WebDriver JSON protocol directly over HTTP against a
//! local driver binary (chromedriver/geckodriver). Only the handful of
//! endpoints the quick-apply flow needs: session lifecycle, navigation,
//! cookies, element lookup, click, keys, and script execution.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

/// W3C element identifier key in element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Errors from the WebDriver bridge.
#[derive(Debug, thiserror::Error)]
pub enum WebDriverError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebDriver error '{error}': {message}")]
    Command { error: String, message: String },

    #[error("No active WebDriver session")]
    NoSession,

    #[error("Malformed WebDriver response: {0}")]
    Protocol(String),
}

impl WebDriverError {
    /// Whether this is the W3C "no such element" error.
    pub fn is_no_such_element(&self) -> bool {
        matches!(self, WebDriverError::Command { error, .. } if error == "no such element")
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    value: Value,
}

/// An element reference scoped to the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef(pub String);

pub struct WebDriverClient {
    http: reqwest::Client,
    base_url: String,
    session_id: Option<String>,
}

impl WebDriverClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, WebDriverError> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_id: None,
        })
    }

    pub fn has_session(&self) -> bool {
        self.session_id.is_some()
    }

    /// Starts a headless browser session.
    pub async fn start_session(&mut self) -> Result<(), WebDriverError> {
        let body = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": [
                            "--headless=new",
                            "--no-sandbox",
                            "--disable-dev-shm-usage",
                            "--disable-gpu",
                            "--window-size=1280,800"
                        ]
                    }
                }
            }
        });
        let value = self.post_raw("/session", &body).await?;
        let session_id = value
            .get("sessionId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| WebDriverError::Protocol("missing sessionId".to_string()))?;
        self.session_id = Some(session_id.to_string());
        debug!("WebDriver session started: {}", session_id);
        Ok(())
    }

    /// Ends the session. Best-effort.
    pub async fn end_session(&mut self) {
        if let Some(session_id) = self.session_id.take() {
            let url = format!("{}/session/{}", self.base_url, session_id);
            let _ = self.http.delete(&url).send().await;
        }
    }

    pub async fn goto(&self, url: &str) -> Result<(), WebDriverError> {
        self.post("/url", &json!({ "url": url })).await?;
        Ok(())
    }

    pub async fn current_url(&self) -> Result<String, WebDriverError> {
        let value = self.get("/url").await?;
        value
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| WebDriverError::Protocol("url is not a string".to_string()))
    }

    /// Adds a cookie to the current browsing context. The context must
    /// already be on a page of the cookie's domain.
    pub async fn add_cookie(
        &self,
        name: &str,
        value: &str,
        domain: &str,
    ) -> Result<(), WebDriverError> {
        let body = json!({
            "cookie": {
                "name": name,
                "value": value,
                "domain": domain,
                "path": "/",
                "secure": true,
            }
        });
        self.post("/cookie", &body).await?;
        Ok(())
    }

    /// Finds the first element matching a CSS selector, or None.
    pub async fn find(&self, css: &str) -> Result<Option<ElementRef>, WebDriverError> {
        let body = json!({ "using": "css selector", "value": css });
        match self.post("/element", &body).await {
            Ok(value) => Ok(Some(Self::element_from_value(&value)?)),
            Err(e) if e.is_no_such_element() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Finds all elements matching a CSS selector.
    pub async fn find_all(&self, css: &str) -> Result<Vec<ElementRef>, WebDriverError> {
        let body = json!({ "using": "css selector", "value": css });
        let value = self.post("/elements", &body).await?;
        let array = value
            .as_array()
            .ok_or_else(|| WebDriverError::Protocol("elements is not an array".to_string()))?;
        array.iter().map(Self::element_from_value).collect()
    }

    pub async fn click(&self, element: &ElementRef) -> Result<(), WebDriverError> {
        self.post(&format!("/element/{}/click", element.0), &json!({}))
            .await?;
        Ok(())
    }

    /// Sends keystrokes to an element (also the W3C file-upload path:
    /// sending a file path to an `input[type=file]`).
    pub async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), WebDriverError> {
        self.post(
            &format!("/element/{}/value", element.0),
            &json!({ "text": text }),
        )
        .await?;
        Ok(())
    }

    pub async fn clear(&self, element: &ElementRef) -> Result<(), WebDriverError> {
        self.post(&format!("/element/{}/clear", element.0), &json!({}))
            .await?;
        Ok(())
    }

    /// Executes synchronous JavaScript in the page, returning its value.
    pub async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, WebDriverError> {
        self.post("/execute/sync", &json!({ "script": script, "args": args }))
            .await
    }

    fn element_from_value(value: &Value) -> Result<ElementRef, WebDriverError> {
        value
            .get(ELEMENT_KEY)
            .and_then(|v| v.as_str())
            .map(|id| ElementRef(id.to_string()))
            .ok_or_else(|| WebDriverError::Protocol("missing element key".to_string()))
    }

    fn session_path(&self, path: &str) -> Result<String, WebDriverError> {
        let session_id = self.session_id.as_ref().ok_or(WebDriverError::NoSession)?;
        Ok(format!("{}/session/{}{}", self.base_url, session_id, path))
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, WebDriverError> {
        let url = self.session_path(path)?;
        let response = self.http.post(&url).json(body).send().await?;
        Self::unwrap_value(response).await
    }

    async fn get(&self, path: &str) -> Result<Value, WebDriverError> {
        let url = self.session_path(path)?;
        let response = self.http.get(&url).send().await?;
        Self::unwrap_value(response).await
    }

    /// POST against a non-session path (session creation).
    async fn post_raw(&self, path: &str, body: &Value) -> Result<Value, WebDriverError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.post(&url).json(body).send().await?;
        Self::unwrap_value(response).await
    }

    /// Unwraps the `{"value": ...}` envelope, mapping W3C error bodies
    /// to `WebDriverError::Command`.
    async fn unwrap_value(response: reqwest::Response) -> Result<Value, WebDriverError> {
        let status = response.status();
        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| WebDriverError::Protocol(e.to_string()))?;

        if !status.is_success() {
            let error = wire
                .value
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string();
            let message = wire
                .value
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            return Err(WebDriverError::Command { error, message });
        }

        Ok(wire.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_session_error_before_start() {
        let client = WebDriverClient::new("http://localhost:9515", Duration::from_secs(5)).unwrap();
        assert!(!client.has_session());
        assert!(matches!(
            client.session_path("/url"),
            Err(WebDriverError::NoSession)
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client =
            WebDriverClient::new("http://localhost:9515/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url, "http://localhost:9515");
    }

    #[test]
    fn test_element_from_value() {
        let value = json!({ ELEMENT_KEY: "abc-123" });
        let element = WebDriverClient::element_from_value(&value).unwrap();
        assert_eq!(element, ElementRef("abc-123".to_string()));

        let bad = json!({ "wrong-key": "abc" });
        assert!(WebDriverClient::element_from_value(&bad).is_err());
    }

    #[test]
    fn test_no_such_element_detection() {
        let err = WebDriverError::Command {
            error: "no such element".to_string(),
            message: "".to_string(),
        };
        assert!(err.is_no_such_element());

        let err = WebDriverError::Command {
            error: "stale element reference".to_string(),
            message: "".to_string(),
        };
        assert!(!err.is_no_such_element());
    }
}
