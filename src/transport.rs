//! HTTP transport used to deliver events.
use reqwest::{StatusCode, Url};
use serde::Serialize;

use crate::{Error, Result};

/// Response returned by a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Decoded JSON body. `Null` if the body was empty, a string if it was not JSON.
    pub data: serde_json::Value,
}

/// Delivers requests to the collection endpoint.
///
/// Failures are returned to the caller unchanged. The SDK never retries.
pub trait Transport {
    /// POST a JSON `body` to `path`, relative to the base URL.
    fn post(&self, path: &str, body: &serde_json::Value) -> Result<Response>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn post(&self, path: &str, body: &serde_json::Value) -> Result<Response> {
        (**self).post(path, body)
    }
}

/// Settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub(crate) struct HttpTransportConfig {
    pub base_url: String,
    pub api_key: String,
    pub default_query_params: Vec<(String, String)>,
}

/// [`Transport`] backed by a blocking `reqwest` client with bearer-token auth.
pub struct HttpTransport {
    // Client holds a connection pool internally, so we're reusing the client between requests.
    client: reqwest::blocking::Client,
    base_url: Url,
    api_key: String,
    default_query_params: Vec<(String, String)>,
}

impl HttpTransport {
    pub(crate) fn new(config: HttpTransportConfig) -> Result<HttpTransport> {
        // A trailing slash makes `Url::join` append paths instead of replacing the last segment.
        let base_url = if config.base_url.ends_with('/') {
            config.base_url
        } else {
            format!("{}/", config.base_url)
        };
        let base_url = Url::parse(&base_url).map_err(Error::InvalidBaseUrl)?;

        Ok(HttpTransport {
            client: reqwest::blocking::Client::new(),
            base_url,
            api_key: config.api_key,
            default_query_params: config.default_query_params,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(Error::InvalidUrl)?;
        if !self.default_query_params.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.default_query_params);
        }
        Ok(url)
    }

    fn send<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Response> {
        let url = self.url(path)?;

        log::debug!(target: "attribution", path; "sending request");
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()?;

        let response = response.error_for_status().map_err(|err| {
            if err.status() == Some(StatusCode::UNAUTHORIZED) {
                log::warn!(target: "attribution", "client is not authorized. Check your API key");
                Error::Unauthorized
            } else {
                log::warn!(target: "attribution", "received non-2xx response: {:?}", err);
                Error::from(err)
            }
        })?;

        let status = response.status().as_u16();
        let text = response.text()?;

        Ok(Response {
            status,
            data: decode_body(text),
        })
    }
}

/// Decode a response body. Bodies that are not JSON are kept as a string: the request has
/// already succeeded, so an unexpected body must not turn it into a failure.
fn decode_body(text: String) -> serde_json::Value {
    if text.trim().is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
}

impl Transport for HttpTransport {
    fn post(&self, path: &str, body: &serde_json::Value) -> Result<Response> {
        self.send(path, body)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::{Read, Write},
        net::TcpListener,
        sync::mpsc,
    };

    use serde_json::json;

    use super::{decode_body, HttpTransport, HttpTransportConfig};
    use crate::{transport::Transport, Error};

    /// Serve a single canned HTTP response on a local port. Returns the base URL and a receiver
    /// for the raw request.
    fn serve_once(response: &'static str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let (sender, receiver) = mpsc::channel();

        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    let headers = String::from_utf8_lossy(&request[..end]).to_lowercase();
                    let content_length = headers
                        .lines()
                        .find_map(|line| line.strip_prefix("content-length:"))
                        .and_then(|value| value.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + content_length {
                        break;
                    }
                }
            }
            let _ = sender.send(String::from_utf8_lossy(&request).into_owned());
            stream.write_all(response.as_bytes()).unwrap();
        });

        (base_url, receiver)
    }

    fn transport(base_url: &str, params: &[(&str, &str)]) -> crate::Result<HttpTransport> {
        HttpTransport::new(HttpTransportConfig {
            base_url: base_url.to_owned(),
            api_key: "api-key".to_owned(),
            default_query_params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }

    #[test]
    fn joins_paths_onto_base_url() {
        let transport = transport("https://api.example.com/api/v1", &[]).unwrap();
        assert_eq!(
            transport.url("events").unwrap().as_str(),
            "https://api.example.com/api/v1/events"
        );
        assert_eq!(
            transport.url("/events").unwrap().as_str(),
            "https://api.example.com/api/v1/events"
        );
    }

    #[test]
    fn appends_default_query_params() {
        let transport =
            transport("https://api.example.com/api/v1/", &[("project", "p1")]).unwrap();
        assert_eq!(
            transport.url("events").unwrap().as_str(),
            "https://api.example.com/api/v1/events?project=p1"
        );
    }

    #[test]
    fn decodes_json_body() {
        assert_eq!(decode_body(r#"{"ok":true}"#.to_owned()), json!({"ok": true}));
    }

    #[test]
    fn empty_body_is_null() {
        assert_eq!(decode_body("  ".to_owned()), serde_json::Value::Null);
    }

    #[test]
    fn non_json_body_is_kept_as_string() {
        assert_eq!(decode_body("OK".to_owned()), json!("OK"));
    }

    #[test]
    fn successful_post_with_plain_text_body() {
        let (base_url, request) =
            serve_once("HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nOK");
        let transport = transport(&base_url, &[("project", "p1")]).unwrap();

        let response = transport.post("events", &json!({"name": "pageview"})).unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.data, json!("OK"));

        let request = request.recv().unwrap();
        assert!(request.starts_with("POST /events?project=p1 HTTP/1.1"));
        assert!(request
            .to_lowercase()
            .contains("authorization: bearer api-key"));
        assert!(request.ends_with(r#"{"name":"pageview"}"#));
    }

    #[test]
    fn unauthorized_response_is_an_error() {
        let (base_url, _request) = serve_once(
            "HTTP/1.1 401 Unauthorized\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let transport = transport(&base_url, &[]).unwrap();

        assert!(matches!(
            transport.post("events", &json!({})),
            Err(Error::Unauthorized)
        ));
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            transport("not a url", &[]),
            Err(Error::InvalidBaseUrl(_))
        ));
    }
}
