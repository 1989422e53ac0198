//! Blocking HTTP seam.
//!
//! The fetcher and installers only talk to [`Transport`], so tests can script
//! responses; [`UreqTransport`] is the production implementation.

use std::io::Read;
use std::time::Duration;

use crate::error::{RateLimitHints, TransportError};

/// Minimal blocking HTTP client used by the engine.
pub trait Transport {
    /// GET `url` and return the body of a 2xx response.
    fn get_text(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, TransportError>;

    /// GET `url` and return a reader over the body of a 2xx response.
    fn open(&self, url: &str) -> Result<Box<dyn Read + Send>, TransportError>;
}

/// [`Transport`] backed by a `ureq` agent.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// `timeout` bounds connecting and each individual read, not the whole
    /// transfer: a slow download that keeps making progress is never cut off.
    pub fn new(user_agent: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .user_agent(user_agent)
            .build();
        Self { agent }
    }

    fn call(&self, request: ureq::Request) -> Result<ureq::Response, TransportError> {
        match request.call() {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(status, response)) => Err(TransportError::Status {
                status,
                rate_limit: RateLimitHints {
                    remaining: response.header("X-RateLimit-Remaining").map(str::to_string),
                    reset: response.header("X-RateLimit-Reset").map(str::to_string),
                },
            }),
            Err(ureq::Error::Transport(transport)) => {
                Err(TransportError::Network(transport.to_string()))
            }
        }
    }
}

impl Transport for UreqTransport {
    fn get_text(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, TransportError> {
        let mut request = self.agent.get(url);
        for (name, value) in headers {
            request = request.set(name, value);
        }
        self.call(request)?
            .into_string()
            .map_err(|e| TransportError::Network(e.to_string()))
    }

    fn open(&self, url: &str) -> Result<Box<dyn Read + Send>, TransportError> {
        let response = self.call(self.agent.get(url))?;
        Ok(Box::new(response.into_reader()))
    }
}
