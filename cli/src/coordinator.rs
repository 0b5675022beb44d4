//! Blocking HTTP adapter for the coordinator REST surface.
//!
//! One invocation performs exactly one request. The client classifies the
//! outcome into the command error taxonomy and decodes success bodies into
//! typed records.

use std::fmt;

use crate::error::CommandError;
use crate::records::{self, Agent, ResourceKind, Slot};

/// HTTP method of a coordinator request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload. JSON bodies are sent with a JSON content type, text
/// bodies (lifecycle states) are sent raw, `None` sends nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    None,
    Json(serde_json::Value),
    Text(&'static str),
}

/// One fully-described coordinator request.
#[derive(Debug, Clone)]
pub struct CoordinatorRequest {
    pub method: Method,
    pub kind: ResourceKind,
    pub sub_path: Option<&'static str>,
    pub query: String,
    pub body: RequestBody,
}

/// Blocking coordinator client.
pub struct CoordinatorClient {
    base_url: String,
    debug: bool,
}

impl CoordinatorClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>, debug: bool) -> Self {
        Self {
            base_url: base_url.into(),
            debug,
        }
    }

    /// Execute `request` and decode the reply as slot records.
    ///
    /// # Errors
    ///
    /// [`CommandError::Transport`] when the coordinator is unreachable,
    /// [`CommandError::Server`] on a non-success status,
    /// [`CommandError::Decode`] when the body is not a slot array, and
    /// [`CommandError::NoResources`] when the array is empty.
    pub fn fetch_slots(&self, request: &CoordinatorRequest) -> Result<Vec<Slot>, CommandError> {
        let raw = self.call(request)?;
        let slots = records::decode_slots(&raw)?;
        if slots.is_empty() {
            return Err(CommandError::NoResources(ResourceKind::Slot));
        }
        Ok(slots)
    }

    /// Execute `request` and decode the reply as agent records.
    ///
    /// # Errors
    ///
    /// Same contract as [`CoordinatorClient::fetch_slots`], for agents.
    pub fn fetch_agents(&self, request: &CoordinatorRequest) -> Result<Vec<Agent>, CommandError> {
        let raw = self.call(request)?;
        let agents = records::decode_agents(&raw)?;
        if agents.is_empty() {
            return Err(CommandError::NoResources(ResourceKind::Agent));
        }
        Ok(agents)
    }

    /// Build the request URL: base address, fixed resource prefix, optional
    /// sub-path, then the query string when non-empty.
    #[must_use]
    pub fn build_url(&self, request: &CoordinatorRequest) -> String {
        let mut url = self.base_url.trim_end_matches('/').to_string();
        url.push('/');
        url.push_str(match request.kind {
            ResourceKind::Slot => "v1/slot/",
            ResourceKind::Agent => "v1/admin/agent",
        });
        if let Some(sub_path) = request.sub_path {
            url.push_str(sub_path);
        }
        if !request.query.is_empty() {
            url.push('?');
            url.push_str(&request.query);
        }
        url
    }

    /// Perform the exchange and return the raw success body.
    fn call(&self, request: &CoordinatorRequest) -> Result<String, CommandError> {
        let url = self.build_url(request);
        self.trace_request(request, &url);

        let req = ureq::request(request.method.as_str(), &url).set("User-Agent", "flotilla");
        let outcome = match &request.body {
            RequestBody::Json(value) => req
                .set("Content-Type", "application/json")
                .send_string(&value.to_string()),
            RequestBody::Text(text) => req.send_string(text),
            RequestBody::None => req.call(),
        };

        let raw = match outcome {
            Ok(response) => response
                .into_string()
                .map_err(|e| CommandError::Transport(e.to_string()))?,
            Err(ureq::Error::Status(status, response)) => {
                let status_text = response.status_text().to_string();
                let body = response.into_string().unwrap_or_default();
                if self.debug {
                    eprintln!("{body}");
                }
                let trimmed = body.trim();
                let reason = if trimmed.is_empty() {
                    status_text
                } else {
                    trimmed.to_string()
                };
                return Err(CommandError::Server { status, reason });
            }
            Err(err) => return Err(CommandError::Transport(err.to_string())),
        };

        if self.debug {
            eprintln!("{raw}");
        }
        Ok(raw)
    }

    /// Trace the exchange as an equivalent curl command on stderr, written
    /// before the request is sent.
    fn trace_request(&self, request: &CoordinatorRequest, url: &str) {
        if !self.debug {
            return;
        }
        match &request.body {
            RequestBody::Json(value) => {
                eprintln!(
                    "curl -H 'Content-Type: application/json' -X{} '{url}' -d '",
                    request.method
                );
                eprintln!("{value}");
                eprintln!("'");
            }
            RequestBody::Text(text) => {
                eprintln!("curl -X{} '{url}' -d '{text}'", request.method);
            }
            RequestBody::None => eprintln!("curl -X{} '{url}'", request.method),
        }
    }
}
