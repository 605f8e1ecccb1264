use crate::driver::{DriverError, Element, UiDriver};
use serde_json::{json, Value};
use std::time::Duration;

/// W3C WebDriver element identifier key.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Page loads on the platform are slow and scripted waits come on top.
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

// ---------------------------------------------------------------------------
// WebDriverSession
// ---------------------------------------------------------------------------

/// Blocking W3C WebDriver client backing [`UiDriver`] in production runs.
/// Talks plain HTTP+JSON to a chromedriver-compatible endpoint.
pub struct WebDriverSession {
    http: reqwest::blocking::Client,
    base: String,
    session_id: String,
}

impl WebDriverSession {
    /// Open a new browser session against `server_url` (e.g. a local
    /// chromedriver). The browser is configured to look less automated.
    pub fn connect(server_url: &str) -> Result<Self, DriverError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()?;
        let base = server_url.trim_end_matches('/').to_string();

        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": [
                            "--no-sandbox",
                            "--disable-dev-shm-usage",
                            "--disable-blink-features=AutomationControlled",
                            "--window-size=1280,900"
                        ],
                        "excludeSwitches": ["enable-automation"]
                    }
                }
            }
        });
        let value = request(&http, reqwest::Method::POST, &format!("{base}/session"), Some(&capabilities))?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::BadResponse("missing sessionId in new-session response".to_string()))?
            .to_string();

        Ok(Self {
            http,
            base,
            session_id,
        })
    }

    /// End the session and close the browser.
    pub fn quit(self) -> Result<(), DriverError> {
        let url = format!("{}/session/{}", self.base, self.session_id);
        request(&self.http, reqwest::Method::DELETE, &url, None)?;
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/session/{}{}", self.base, self.session_id, path)
    }

    fn post(&self, path: &str, body: &Value) -> Result<Value, DriverError> {
        request(&self.http, reqwest::Method::POST, &self.endpoint(path), Some(body))
    }

    fn get(&self, path: &str) -> Result<Value, DriverError> {
        request(&self.http, reqwest::Method::GET, &self.endpoint(path), None)
    }
}

/// Issue one WebDriver request and unwrap the W3C `value` envelope. Error
/// responses carry `{"value": {"error", "message"}}`.
fn request(
    http: &reqwest::blocking::Client,
    method: reqwest::Method,
    url: &str,
    body: Option<&Value>,
) -> Result<Value, DriverError> {
    let mut builder = http.request(method, url);
    if let Some(body) = body {
        builder = builder.json(body);
    }
    let response = builder.send()?;
    let ok = response.status().is_success();
    let envelope: Value = response.json()?;
    let value = envelope.get("value").cloned().unwrap_or(Value::Null);
    if !ok {
        let error = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(DriverError::Protocol { error, message });
    }
    Ok(value)
}

impl UiDriver for WebDriverSession {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.post("/url", &json!({ "url": url }))?;
        Ok(())
    }

    fn find_all(&mut self, css: &str) -> Result<Vec<Element>, DriverError> {
        let value = self.post("/elements", &json!({ "using": "css selector", "value": css }))?;
        let handles = value
            .as_array()
            .ok_or_else(|| DriverError::BadResponse("elements response is not a list".to_string()))?;
        handles
            .iter()
            .map(|h| {
                h.get(ELEMENT_KEY)
                    .and_then(Value::as_str)
                    .map(|id| Element(id.to_string()))
                    .ok_or_else(|| {
                        DriverError::BadResponse("element handle missing identifier".to_string())
                    })
            })
            .collect()
    }

    fn element_text(&mut self, element: &Element) -> Result<String, DriverError> {
        let value = self.get(&format!("/element/{}/text", element.0))?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| DriverError::BadResponse("element text is not a string".to_string()))
    }

    fn click(&mut self, element: &Element) -> Result<(), DriverError> {
        self.post(&format!("/element/{}/click", element.0), &json!({}))?;
        Ok(())
    }

    fn run_script(&mut self, script: &str) -> Result<Value, DriverError> {
        self.post("/execute/sync", &json!({ "script": script, "args": [] }))
    }

    fn current_url(&mut self) -> Result<String, DriverError> {
        let value = self.get("/url")?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| DriverError::BadResponse("current url is not a string".to_string()))
    }

    fn cookies(&mut self) -> Result<Vec<Value>, DriverError> {
        let value = self.get("/cookie")?;
        value
            .as_array()
            .cloned()
            .ok_or_else(|| DriverError::BadResponse("cookie response is not a list".to_string()))
    }

    fn add_cookie(&mut self, cookie: &Value) -> Result<(), DriverError> {
        self.post("/cookie", &json!({ "cookie": cookie }))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn session(server: &mockito::Server) -> WebDriverSession {
        WebDriverSession {
            http: reqwest::blocking::Client::new(),
            base: server.url(),
            session_id: "sess-1".to_string(),
        }
    }

    #[test]
    fn connect_parses_the_session_id() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/session")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "capabilities": { "alwaysMatch": { "browserName": "chrome" } }
            })))
            .with_body(r#"{"value": {"sessionId": "sess-42", "capabilities": {}}}"#)
            .create();

        let driver = WebDriverSession::connect(&server.url()).unwrap();
        assert_eq!(driver.session_id, "sess-42");
        mock.assert();
    }

    #[test]
    fn find_all_maps_w3c_element_handles() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/session/sess-1/elements")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "using": "css selector", "value": "button"
            })))
            .with_body(format!(
                r#"{{"value": [{{"{k}": "e1"}}, {{"{k}": "e2"}}]}}"#,
                k = ELEMENT_KEY
            ))
            .create();

        let mut driver = session(&server);
        let elements = driver.find_all("button").unwrap();
        assert_eq!(elements, vec![Element("e1".into()), Element("e2".into())]);
    }

    #[test]
    fn element_text_and_current_url_unwrap_strings() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/session/sess-1/element/e1/text")
            .with_body(r#"{"value": "Following"}"#)
            .create();
        server
            .mock("GET", "/session/sess-1/url")
            .with_body(r#"{"value": "https://x.test/alice/"}"#)
            .create();

        let mut driver = session(&server);
        assert_eq!(driver.element_text(&Element("e1".into())).unwrap(), "Following");
        assert_eq!(driver.current_url().unwrap(), "https://x.test/alice/");
    }

    #[test]
    fn error_envelope_surfaces_as_protocol_error() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/session/sess-1/element/gone/click")
            .with_status(404)
            .with_body(r#"{"value": {"error": "stale element reference", "message": "element is stale"}}"#)
            .create();

        let mut driver = session(&server);
        let err = driver.click(&Element("gone".into())).unwrap_err();
        match err {
            DriverError::Protocol { error, message } => {
                assert_eq!(error, "stale element reference");
                assert_eq!(message, "element is stale");
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn add_cookie_wraps_the_payload() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/session/sess-1/cookie")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "cookie": { "name": "sessionid" }
            })))
            .with_body(r#"{"value": null}"#)
            .create();

        let mut driver = session(&server);
        driver
            .add_cookie(&serde_json::json!({ "name": "sessionid", "value": "abc" }))
            .unwrap();
        mock.assert();
    }
}
