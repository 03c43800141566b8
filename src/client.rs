use std::env;
use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use futures::stream::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use url::Url;

use crate::client_logger::ClientLogger;
use crate::data_stream::process_data_stream;
use crate::error::{Error, Result};
use crate::observability;
use crate::types::{ChatReply, ChatRequest, Message, StreamEvent};

/// The endpoint used when neither an explicit URL nor the environment
/// variable is set. This matches the backend's local development default.
const DEFAULT_CHAT_URL: &str = "http://localhost:8000/chat";

/// Environment variable consulted when no URL is configured explicitly.
const CHAT_URL_ENV: &str = "CHATLINE_CHAT_URL";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for a chat endpoint.
///
/// The endpoint accepts an HTTP POST carrying the conversation history and
/// replies either with a single JSON body or with an incrementally streamed
/// body representing one assistant message.
#[derive(Clone)]
pub struct ChatEndpoint {
    client: ReqwestClient,
    url: Url,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl ChatEndpoint {
    /// Create a new chat endpoint client.
    ///
    /// The URL can be provided directly or read from the CHATLINE_CHAT_URL
    /// environment variable; absent both, the local development default is
    /// used.
    pub fn new(url: Option<String>) -> Result<Self> {
        Self::with_options(url, None)
    }

    /// Create a new client with a custom request timeout.
    pub fn with_options(url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let url = match url {
            Some(url) => url,
            None => env::var(CHAT_URL_ENV).unwrap_or_else(|_| DEFAULT_CHAT_URL.to_string()),
        };
        let url = Url::parse(&url)?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            url,
            timeout,
            logger: None,
        })
    }

    /// Attaches a logger that observes requests and stream events.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Returns the configured endpoint URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Create and return default headers for requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    /// Map a failed send into our error taxonomy.
    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {e}"),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
        }
    }

    /// Process non-success responses and convert to our Error type.
    async fn process_error_response(response: Response) -> Error {
        let status = response.status();
        let status_code = status.as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        // Try to parse a FastAPI-style error body
        #[derive(Deserialize)]
        struct ErrorResponse {
            detail: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        let error_message = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.detail)
            .unwrap_or_else(|| error_body.clone());

        // Map HTTP status code to appropriate error type
        match status_code {
            400 => Error::bad_request(error_message, None),
            408 => Error::timeout(error_message, None),
            500 => Error::internal_server(error_message),
            502..=504 => Error::service_unavailable(error_message, retry_after),
            _ => Error::api(status_code, None, error_message),
        }
    }

    /// Send the conversation history and get a buffered reply.
    pub async fn send(&self, messages: &[Message]) -> Result<String> {
        let request = ChatRequest::from(messages);
        if let Some(logger) = &self.logger {
            logger.log_request(&request);
        }
        observability::CLIENT_REQUESTS.click();

        let response = self
            .client
            .post(self.url.clone())
            .headers(self.default_headers())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                observability::CLIENT_REQUEST_ERRORS.click();
                self.map_send_error(e)
            })?;

        if !response.status().is_success() {
            observability::CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        let reply = response.json::<ChatReply>().await.map_err(|e| {
            Error::serialization(format!("Failed to parse reply: {e}"), Some(Box::new(e)))
        })?;
        let content = reply.into_content();
        if let Some(logger) = &self.logger {
            logger.log_reply(&content);
        }
        Ok(content)
    }

    /// Send the conversation history and get a streaming reply.
    ///
    /// Returns a stream of StreamEvent objects that can be processed
    /// incrementally. Dropping the stream abandons the in-flight request.
    pub async fn stream(
        &self,
        messages: &[Message],
    ) -> Result<impl Stream<Item = Result<StreamEvent>>> {
        let request = ChatRequest::from(messages);
        if let Some(logger) = &self.logger {
            logger.log_request(&request);
        }
        observability::CLIENT_REQUESTS.click();

        let mut headers = self.default_headers();
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/event-stream"));

        let response = self
            .client
            .post(self.url.clone())
            .headers(headers)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                observability::CLIENT_REQUEST_ERRORS.click();
                self.map_send_error(e)
            })?;

        if !response.status().is_success() {
            observability::CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }

        // Get the byte stream from the response and decode it
        let stream = response.bytes_stream();
        let event_stream = process_data_stream(stream);

        let logger = self.logger.clone();
        let event_stream = event_stream.map(move |event| {
            match &event {
                Ok(event) => {
                    observability::STREAM_EVENTS.click();
                    if let Some(logger) = &logger {
                        logger.log_stream_event(event);
                    }
                }
                Err(_) => {
                    observability::STREAM_ERRORS.click();
                }
            }
            event
        });

        Ok(event_stream)
    }
}

impl std::fmt::Debug for ChatEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatEndpoint")
            .field("url", &self.url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let client = ChatEndpoint::new(Some("http://localhost:8000/chat".to_string())).unwrap();
        assert_eq!(client.url().as_str(), "http://localhost:8000/chat");
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);

        let client = ChatEndpoint::with_options(
            Some("https://chat.example.com/api/chat".to_string()),
            Some(Duration::from_secs(30)),
        )
        .unwrap();
        assert_eq!(client.url().as_str(), "https://chat.example.com/api/chat");
        assert_eq!(client.timeout, Duration::from_secs(30));
    }

    #[test]
    fn rejects_invalid_url() {
        let result = ChatEndpoint::new(Some("not a url".to_string()));
        assert!(result.is_err());
    }
}
