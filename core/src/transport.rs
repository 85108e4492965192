//! The network seam between the executor and an HTTP implementation.
//!
//! # Design
//! `Transport` sends exactly one request and reports either the raw response
//! or a classified `TransportError`. It never retries and never looks at the
//! status code; both are the executor's job. `UreqTransport` is the production
//! implementation. ureq is synchronous, so each send runs on tokio's blocking
//! pool.

use std::io;

use async_trait::async_trait;

use crate::config::TransportConfig;
use crate::error::{TransportError, TransportErrorKind};
use crate::http::{CallDescriptor, HttpMethod, HttpResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, call: &CallDescriptor) -> Result<HttpResponse, TransportError>;
}

/// HTTP transport backed by a shared `ureq::Agent`.
///
/// The agent's idle pool is capped at `max_connections_per_host`. Status codes
/// are returned as data so the executor can classify them.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(config: &TransportConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_per_call(Some(config.request_timeout))
            .timeout_global(Some(config.resource_timeout))
            .max_idle_connections_per_host(config.max_connections_per_host.max(1))
            .build()
            .new_agent();
        Self { agent }
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn send(&self, call: &CallDescriptor) -> Result<HttpResponse, TransportError> {
        let agent = self.agent.clone();
        let call = call.clone();
        tokio::task::spawn_blocking(move || send_blocking(&agent, &call))
            .await
            .map_err(|e| {
                let kind = if e.is_cancelled() {
                    TransportErrorKind::Cancelled
                } else {
                    TransportErrorKind::Other
                };
                TransportError::new(kind, format!("transport task failed: {e}"))
            })?
            .map_err(classify_ureq_error)
    }
}

fn send_blocking(agent: &ureq::Agent, call: &CallDescriptor) -> Result<HttpResponse, ureq::Error> {
    let url = call.url.as_str();
    let mut response = match call.method {
        HttpMethod::Get => {
            let mut request = agent.get(url);
            for (name, value) in &call.headers {
                request = request.header(name.as_str(), value.as_str());
            }
            request.call()?
        }
        HttpMethod::Post => {
            let mut request = agent.post(url);
            for (name, value) in &call.headers {
                request = request.header(name.as_str(), value.as_str());
            }
            match &call.body {
                Some(body) => request.send(body.as_bytes())?,
                None => request.send_empty()?,
            }
        }
    };

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_vec()?;
    Ok(HttpResponse { status, body })
}

/// Map a ureq failure onto the client's transport taxonomy.
pub(crate) fn classify_ureq_error(err: ureq::Error) -> TransportError {
    let kind = match &err {
        ureq::Error::Io(io_err) => classify_io_error(io_err),
        ureq::Error::Timeout(_) => TransportErrorKind::Timeout,
        ureq::Error::HostNotFound => TransportErrorKind::Dns,
        ureq::Error::ConnectionFailed => TransportErrorKind::Refused,
        ureq::Error::Tls(_) => TransportErrorKind::Tls,
        _ => TransportErrorKind::Other,
    };
    TransportError::new(kind, err.to_string())
}

fn classify_io_error(err: &io::Error) -> TransportErrorKind {
    match err.kind() {
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::UnexpectedEof => TransportErrorKind::ConnectionLost,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TransportErrorKind::Timeout,
        io::ErrorKind::ConnectionRefused | io::ErrorKind::AddrNotAvailable => {
            TransportErrorKind::Refused
        }
        _ => TransportErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn io(kind: io::ErrorKind) -> ureq::Error {
        ureq::Error::Io(io::Error::new(kind, "test"))
    }

    #[test]
    fn dropped_connections_are_connection_lost() {
        for kind in [
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::ConnectionAborted,
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::UnexpectedEof,
        ] {
            assert_eq!(
                classify_ureq_error(io(kind)).kind,
                TransportErrorKind::ConnectionLost,
                "{kind:?}"
            );
        }
    }

    #[test]
    fn other_failures_are_not_connection_lost() {
        assert_eq!(
            classify_ureq_error(io(io::ErrorKind::TimedOut)).kind,
            TransportErrorKind::Timeout
        );
        assert_eq!(
            classify_ureq_error(io(io::ErrorKind::ConnectionRefused)).kind,
            TransportErrorKind::Refused
        );
        assert_eq!(
            classify_ureq_error(ureq::Error::HostNotFound).kind,
            TransportErrorKind::Dns
        );
        assert_eq!(
            classify_ureq_error(ureq::Error::ConnectionFailed).kind,
            TransportErrorKind::Refused
        );
    }

    #[tokio::test]
    async fn refused_connection_is_not_retryable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let builder = crate::request::RequestBuilder::new(
            &format!("http://{addr}"),
            crate::config::CachePolicy::UseProtocolDefault,
        )
        .unwrap();
        let call = builder
            .build::<()>(
                crate::http::Operation::ListStudents,
                &[],
                &crate::request::QueryParams::new(),
                None,
            )
            .unwrap();

        let err = UreqTransport::new(&TransportConfig::default())
            .send(&call)
            .await
            .unwrap_err();
        assert!(!err.is_retryable(), "{err}");
    }
}
