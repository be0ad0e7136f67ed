// Copyright 2018 Dmitry Tantsur <divius.inside@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error and Result implementations.

use std::fmt;
use std::io;
use std::time::Duration;

use reqwest::StatusCode;

/// Kind of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Authentication failure
    ///
    /// Maps to HTTP 401.
    AuthenticationFailed,

    /// Access denied.
    ///
    /// Maps to HTTP 403.
    AccessDenied,

    /// Requested resource was not found.
    ///
    /// Roughly maps to HTTP 404 and 410.
    ResourceNotFound,

    /// Request returned more items than expected.
    TooManyItems,

    /// Requested service endpoint was not found.
    EndpointNotFound,

    /// Invalid value passed to one of paremeters.
    ///
    /// May be result of HTTP 400.
    InvalidInput,

    /// Unsupported or incompatible API version.
    ///
    /// May be a result of HTTP 406.
    IncompatibleApiVersion,

    /// Conflict in the request.
    Conflict,

    /// Resource has not reached the requested status in time.
    OperationTimedOut,

    /// Resource has reached one of its failure statuses.
    OperationFailed,

    /// Protocol-level error reported by underlying HTTP library.
    ProtocolError,

    /// Response received from the server is malformed.
    InvalidResponse,

    /// Internal server error.
    ///
    /// Maps to HTTP 5xx codes.
    InternalServerError,

    /// Configuration is missing or cannot be parsed.
    InvalidConfig,
}

/// Details of a failed wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitContext {
    /// Human-readable type of the resource, e.g. `volume`.
    pub resource_type: String,
    /// Identifier of the resource.
    pub resource_id: String,
    /// Status that was waited for (if any).
    pub target: Option<String>,
    /// Last status observed before the wait ended.
    pub last_status: Option<String>,
    /// Time spent waiting (known only for timeouts).
    pub elapsed: Option<Duration>,
}

/// Error from an OpenStack call or a wait.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    status: Option<StatusCode>,
    message: Option<String>,
    wait: Option<Box<WaitContext>>,
}

/// Result of an OpenStack call.
pub type Result<T> = ::std::result::Result<T, Error>;

impl Error {
    /// Create a new error of the provided kind.
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Error {
        Error {
            kind,
            status: None,
            message: Some(message.into()),
            wait: None,
        }
    }

    /// Create with providing all details.
    pub(crate) fn new_with_details(
        kind: ErrorKind,
        status: Option<StatusCode>,
        message: Option<String>,
    ) -> Error {
        Error {
            kind,
            status,
            message,
            wait: None,
        }
    }

    /// Timeout while waiting for a resource.
    pub(crate) fn timed_out(context: WaitContext) -> Error {
        let elapsed = context.elapsed.unwrap_or_default().as_secs_f64();
        let message = match context.target {
            Some(ref target) => format!(
                "{} {} failed to reach {} status (current {}) within the required time ({} s)",
                context.resource_type,
                context.resource_id,
                target,
                context.last_status.as_deref().unwrap_or("unknown"),
                elapsed
            ),
            None => format!(
                "{} {} was not ready within the required time ({} s)",
                context.resource_type, context.resource_id, elapsed
            ),
        };
        Error {
            kind: ErrorKind::OperationTimedOut,
            status: None,
            message: Some(message),
            wait: Some(Box::new(context)),
        }
    }

    /// A resource got into one of its failure statuses.
    pub(crate) fn operation_failed(context: WaitContext) -> Error {
        let message = format!(
            "{} {} failed and is in {} status",
            context.resource_type,
            context.resource_id,
            context.last_status.as_deref().unwrap_or("unknown")
        );
        Error {
            kind: ErrorKind::OperationFailed,
            status: None,
            message: Some(message),
            wait: Some(Box::new(context)),
        }
    }

    /// Error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// HTTP status code (if any).
    #[inline]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Details of the failed wait (only for waiter errors).
    #[inline]
    pub fn wait_context(&self) -> Option<&WaitContext> {
        self.wait.as_deref()
    }

    /// Helper - error of kind EndpointNotFound.
    pub(crate) fn new_endpoint_not_found<D: fmt::Display>(service_type: D) -> Error {
        Error::new(
            ErrorKind::EndpointNotFound,
            format!("Endpoint for service {} was not found", service_type),
        )
    }

    /// Build an error from an HTTP status code.
    pub(crate) fn from_status(status: StatusCode, message: String) -> Error {
        Error::new_with_details(ErrorKind::from(status), Some(status), Some(message))
    }
}

impl ErrorKind {
    /// Short description of the error kind.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::AuthenticationFailed => "Failed to authenticate",
            ErrorKind::AccessDenied => "Access to the resource is denied",
            ErrorKind::ResourceNotFound => "Requested resource was not found",
            ErrorKind::TooManyItems => "Request returned too many items",
            ErrorKind::EndpointNotFound => "Requested endpoint was not found",
            ErrorKind::InvalidInput => "Input value(s) are invalid or missing",
            ErrorKind::IncompatibleApiVersion => "Incompatible or unsupported API version",
            ErrorKind::Conflict => "Requested cannot be fulfilled due to a conflict",
            ErrorKind::OperationTimedOut => "Time out reached while waiting for the operation",
            ErrorKind::OperationFailed => "Requested operation has failed",
            ErrorKind::ProtocolError => "Error when accessing the server",
            ErrorKind::InvalidResponse => "Received invalid response",
            ErrorKind::InternalServerError => "Internal server error or bad gateway",
            ErrorKind::InvalidConfig => "Configuration file cannot be found or is invalid",
        }
    }
}

impl From<StatusCode> for ErrorKind {
    fn from(value: StatusCode) -> ErrorKind {
        match value {
            StatusCode::UNAUTHORIZED => ErrorKind::AuthenticationFailed,
            StatusCode::FORBIDDEN => ErrorKind::AccessDenied,
            StatusCode::NOT_FOUND | StatusCode::GONE => ErrorKind::ResourceNotFound,
            StatusCode::NOT_ACCEPTABLE => ErrorKind::IncompatibleApiVersion,
            StatusCode::CONFLICT => ErrorKind::Conflict,
            c if c.is_client_error() => ErrorKind::InvalidInput,
            c if c.is_server_error() => ErrorKind::InternalServerError,
            _ => ErrorKind::InvalidResponse,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(ref msg) = self.message {
            write!(f, ": {}", msg)
        } else {
            Ok(())
        }
    }
}

impl ::std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Error {
        let msg = value.to_string();
        match value.status() {
            Some(status) => Error::from_status(status, msg),
            None if value.is_decode() => Error::new(ErrorKind::InvalidResponse, msg),
            None if value.is_builder() => Error::new(ErrorKind::InvalidInput, msg),
            None => Error::new(ErrorKind::ProtocolError, msg),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Error {
        Error::new(
            ErrorKind::InvalidResponse,
            format!("Cannot decode JSON: {}", value),
        )
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(value: serde_yaml::Error) -> Error {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("Cannot parse configuration: {}", value),
        )
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Error {
        Error::new(ErrorKind::ProtocolError, value.to_string())
    }
}

#[cfg(test)]
pub mod test {
    #![allow(missing_docs)]

    use std::time::Duration;

    use reqwest::StatusCode;

    use super::{Error, ErrorKind, WaitContext};

    #[test]
    fn test_kind_from_status() {
        assert_eq!(
            ErrorKind::from(StatusCode::UNAUTHORIZED),
            ErrorKind::AuthenticationFailed
        );
        assert_eq!(
            ErrorKind::from(StatusCode::GONE),
            ErrorKind::ResourceNotFound
        );
        assert_eq!(
            ErrorKind::from(StatusCode::BAD_REQUEST),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            ErrorKind::from(StatusCode::BAD_GATEWAY),
            ErrorKind::InternalServerError
        );
    }

    #[test]
    fn test_timeout_message() {
        let err = Error::timed_out(WaitContext {
            resource_type: "volume".into(),
            resource_id: "vol-1".into(),
            target: Some("available".into()),
            last_status: Some("creating".into()),
            elapsed: Some(Duration::from_secs(10)),
        });
        assert_eq!(err.kind(), ErrorKind::OperationTimedOut);
        let text = err.to_string();
        assert!(text.contains("vol-1"), "{}", text);
        assert!(text.contains("available"), "{}", text);
        assert!(text.contains("creating"), "{}", text);
        assert_eq!(
            err.wait_context().unwrap().last_status.as_deref(),
            Some("creating")
        );
    }

    #[test]
    fn test_plain_error_has_no_context() {
        let err = Error::new(ErrorKind::Conflict, "busy");
        assert!(err.wait_context().is_none());
        assert_eq!(err.to_string(), "Requested cannot be fulfilled due to a conflict: busy");
    }
}
