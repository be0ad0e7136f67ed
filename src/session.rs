// Copyright 2017 Dmitry Tantsur <divius.inside@gmail.com>
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

//! Session structure definition.
//!
//! The `Session` is a blocking wrapper around an asynchronous HTTP client. It
//! knows the endpoint of every configured service, sends the authentication
//! token and the requested microversion, and converts HTTP errors into
//! [Error](../struct.Error.html) values.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::runtime::{Builder as RuntimeBuilder, Runtime};

use super::common::{assert_version_header_matches_request, VersionRequest};
use super::config::Config;
use super::service::{self, ServiceType};
use super::utils::url;
use super::waiter::WaitPolicy;
use super::{Error, ErrorKind, Result};

/// Header carrying the authentication token.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

#[derive(Debug, Clone)]
struct ServiceInfo {
    endpoint: Url,
    microversion: Option<VersionRequest>,
    wait_policy: WaitPolicy,
}

/// An OpenStack API session.
///
/// Cloning is cheap: clones share the HTTP client and the runtime.
#[derive(Clone)]
pub struct Session {
    client: Client,
    runtime: Rc<Runtime>,
    token: Option<String>,
    services: HashMap<ServiceType, ServiceInfo>,
}

/// A request to one of the services.
#[must_use = "requests do nothing until sent"]
pub struct Request<'s> {
    session: &'s Session,
    service: ServiceType,
    method: Method,
    url: Url,
    inner: RequestBuilder,
    expected_status: Option<StatusCode>,
    microversion: Option<String>,
}

/// A fully read response.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

fn error_message(status: StatusCode, body: &[u8]) -> String {
    // Most services wrap errors as {"itemNotFound": {"message": "..."}},
    // Neutron uses {"NeutronError": {"message": "..."}}.
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        let found = match value {
            serde_json::Value::Object(ref map) => map.values().find_map(|v| {
                v.get("message")
                    .or_else(|| v.get("faultstring"))
                    .and_then(|m| m.as_str())
                    .map(String::from)
            }),
            _ => None,
        };
        if let Some(message) = found.or_else(|| {
            value
                .get("message")
                .and_then(|m| m.as_str())
                .map(String::from)
        }) {
            return message;
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        text.to_string()
    }
}

impl Session {
    /// Create a session without any endpoints.
    pub fn new() -> Result<Session> {
        let runtime = RuntimeBuilder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                Error::new(
                    ErrorKind::ProtocolError,
                    format!("Could not create a runtime: {}", e),
                )
            })?;
        Ok(Session {
            client: Client::builder().build()?,
            runtime: Rc::new(runtime),
            token: None,
            services: HashMap::new(),
        })
    }

    /// Create a session from a configuration.
    pub fn from_config(config: &Config) -> Result<Session> {
        let mut session = Session::new()?;
        session.token = config.auth.token.clone();

        for service in service::ALL {
            let section = config.service(service);
            if let Some(ref endpoint) = section.endpoint {
                let url = url::parse_endpoint(endpoint)?;
                if url::is_root(&url) {
                    warn!(
                        "Endpoint {} for service {} has no path, the API version prefix may be missing",
                        url, service
                    );
                }

                let min = section.min_microversion.unwrap_or_default();
                let microversion = if min != VersionRequest::default() {
                    Some(min)
                } else {
                    None
                };

                let _ = session.services.insert(
                    service,
                    ServiceInfo {
                        endpoint: url,
                        microversion,
                        wait_policy: section.wait_policy(),
                    },
                );
            }
        }

        debug!(
            "Created a session with endpoints for {:?}",
            session
                .services
                .keys()
                .map(|s| s.catalog_type())
                .collect::<Vec<_>>()
        );
        Ok(session)
    }

    /// Create a session from the configuration file found via environment.
    ///
    /// See [Config::from_env](../config/struct.Config.html#method.from_env).
    pub fn from_env() -> Result<Session> {
        Session::from_config(&Config::from_env()?)
    }

    /// Set the authentication token.
    pub fn with_token<S: Into<String>>(mut self, token: S) -> Session {
        self.token = Some(token.into());
        self
    }

    /// Set the endpoint of a service.
    pub fn with_endpoint<S: AsRef<str>>(
        mut self,
        service: ServiceType,
        endpoint: S,
    ) -> Result<Session> {
        let endpoint = url::parse_endpoint(endpoint.as_ref())?;
        match self.services.get_mut(&service) {
            Some(info) => info.endpoint = endpoint,
            None => {
                let _ = self.services.insert(
                    service,
                    ServiceInfo {
                        endpoint,
                        microversion: None,
                        wait_policy: WaitPolicy::default(),
                    },
                );
            }
        }
        Ok(self)
    }

    /// Set the wait policy used for resources of a service.
    pub fn with_wait_policy(mut self, service: ServiceType, policy: WaitPolicy) -> Result<Session> {
        self.service_info_mut(service)?.wait_policy = policy;
        Ok(self)
    }

    /// Request the given microversion from a service.
    ///
    /// The null version `0.0` removes the microversion.
    pub fn set_microversion(
        &mut self,
        service: ServiceType,
        version: VersionRequest,
    ) -> Result<()> {
        if service.version_header().is_none() {
            return Err(Error::new(
                ErrorKind::IncompatibleApiVersion,
                format!("Service {} does not support microversions", service),
            ));
        }

        let info = self.service_info_mut(service)?;
        info.microversion = if version == VersionRequest::default() {
            None
        } else {
            Some(version)
        };
        Ok(())
    }

    /// Convert this session into one using the given microversion.
    pub fn with_microversion(
        mut self,
        service: ServiceType,
        version: VersionRequest,
    ) -> Result<Session> {
        self.set_microversion(service, version)?;
        Ok(self)
    }

    /// Microversion requested from a service (if any).
    pub fn microversion(&self, service: ServiceType) -> Option<VersionRequest> {
        self.services.get(&service).and_then(|info| info.microversion)
    }

    /// Wait policy for resources of a service.
    ///
    /// Services without configuration get the default policy.
    pub fn wait_policy(&self, service: ServiceType) -> WaitPolicy {
        self.services
            .get(&service)
            .map(|info| info.wait_policy)
            .unwrap_or_default()
    }

    /// Construct an endpoint URL for the given service and path.
    pub fn get_endpoint<I>(&self, service: ServiceType, path: I) -> Result<Url>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let info = self
            .services
            .get(&service)
            .ok_or_else(|| Error::new_endpoint_not_found(service))?;
        url::extend(info.endpoint.clone(), path)
    }

    /// Start a request to the given service.
    pub fn request<I>(&self, service: ServiceType, method: Method, path: I) -> Result<Request<'_>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let url = self.get_endpoint(service, path)?;
        trace!("Preparing {} {}", method, url);

        let mut inner = self.client.request(method.clone(), url.clone());
        if let Some(ref token) = self.token {
            inner = inner.header(AUTH_TOKEN_HEADER, token.as_str());
        }

        let mut microversion = None;
        if let (Some(header), Some(version)) =
            (service.version_header(), self.microversion(service))
        {
            let value = service.version_header_value(version);
            inner = inner.header(header, value.as_str());
            if version != VersionRequest::Latest {
                microversion = Some(value);
            }
        }

        Ok(Request {
            session: self,
            service,
            method,
            url,
            inner,
            expected_status: None,
            microversion,
        })
    }

    /// Start a GET request.
    #[inline]
    pub fn get<I>(&self, service: ServiceType, path: I) -> Result<Request<'_>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.request(service, Method::GET, path)
    }

    /// Start a POST request.
    #[inline]
    pub fn post<I>(&self, service: ServiceType, path: I) -> Result<Request<'_>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.request(service, Method::POST, path)
    }

    /// Start a PUT request.
    #[inline]
    pub fn put<I>(&self, service: ServiceType, path: I) -> Result<Request<'_>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.request(service, Method::PUT, path)
    }

    /// Start a DELETE request.
    #[inline]
    pub fn delete<I>(&self, service: ServiceType, path: I) -> Result<Request<'_>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.request(service, Method::DELETE, path)
    }

    fn service_info_mut(&mut self, service: ServiceType) -> Result<&mut ServiceInfo> {
        self.services
            .get_mut(&service)
            .ok_or_else(|| Error::new_endpoint_not_found(service))
    }

    #[inline]
    fn block_on<F: Future>(&self, f: F) -> F::Output {
        self.runtime.block_on(f)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "<hidden>"))
            .field("services", &self.services)
            .finish()
    }
}

impl<'s> Request<'s> {
    /// Add a query to the URL.
    pub fn query<Q: Serialize + ?Sized>(mut self, query: &Q) -> Request<'s> {
        self.inner = self.inner.query(query);
        self
    }

    /// Add a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Request<'s> {
        self.inner = self.inner.json(body);
        self
    }

    /// Add a raw body.
    pub fn body<B: Into<reqwest::Body>>(mut self, body: B) -> Request<'s> {
        self.inner = self.inner.body(body);
        self
    }

    /// Add a header.
    pub fn header(mut self, key: &str, value: &str) -> Request<'s> {
        self.inner = self.inner.header(key, value);
        self
    }

    /// Require the given success status code.
    ///
    /// Any other success code results in `InvalidResponse`.
    pub fn expect_status(mut self, status: u16) -> Request<'s> {
        self.expected_status = StatusCode::from_u16(status).ok();
        self
    }

    /// Send the request and read the whole response.
    pub fn send(self) -> Result<Response> {
        let Request {
            session,
            service,
            method,
            url,
            inner,
            expected_status,
            microversion,
        } = self;

        debug!("Sending {} {}", method, url);
        let response = session.block_on(async move {
            let response = inner.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Ok::<_, Error>(Response {
                status,
                headers,
                body: body.to_vec(),
            })
        })?;
        trace!("{} {} returned {}", method, url, response.status);

        if !response.status.is_success() {
            let message = error_message(response.status, &response.body);
            debug!(
                "{} {} failed with HTTP {}: {}",
                method, url, response.status, message
            );
            return Err(Error::from_status(response.status, message));
        }

        if let Some(expected) = expected_status {
            if response.status != expected {
                return Err(Error::new_with_details(
                    ErrorKind::InvalidResponse,
                    Some(response.status),
                    Some(format!(
                        "{} {} returned {} instead of the expected {}",
                        method, url, response.status, expected
                    )),
                ));
            }
        }

        if let (Some(header), Some(value)) = (service.version_header(), microversion) {
            assert_version_header_matches_request(header, &value, &response.headers)?;
        }

        Ok(response)
    }

    /// Send the request and decode the JSON response.
    pub fn fetch<T: DeserializeOwned>(self) -> Result<T> {
        self.send()?.json()
    }
}

impl fmt::Debug for Request<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("service", &self.service)
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("expected_status", &self.expected_status)
            .finish()
    }
}

impl Response {
    /// HTTP status code.
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body.
    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(From::from)
    }
}

#[cfg(test)]
pub mod test {
    #![allow(missing_docs)]

    use reqwest::StatusCode;

    use super::super::common::VersionRequest;
    use super::super::config::Config;
    use super::super::service::{BLOCK_STORAGE, COMPUTE, IMAGE, NETWORK};
    use super::super::waiter::WaitPolicy;
    use super::super::ErrorKind;
    use super::{error_message, Session};

    const CONFIG: &str = r#"
auth:
  token: secret
compute:
  endpoint: http://127.0.0.1:8774/v2.1
  min_microversion: "2.10"
  build_timeout: 60
network:
  endpoint: http://127.0.0.1:9696/v2.0/
"#;

    #[test]
    fn test_from_config() {
        let session = Session::from_config(&Config::from_yaml(CONFIG).unwrap()).unwrap();
        assert_eq!(
            session
                .get_endpoint(NETWORK, &["networks", "abcd"])
                .unwrap()
                .as_str(),
            "http://127.0.0.1:9696/v2.0/networks/abcd"
        );
        assert_eq!(
            session.microversion(COMPUTE),
            Some("2.10".parse().unwrap())
        );
        assert_eq!(session.wait_policy(COMPUTE).timeout.as_secs(), 60);
        assert_eq!(session.wait_policy(BLOCK_STORAGE), WaitPolicy::default());
        assert!(!format!("{:?}", session).contains("secret"));
    }

    #[test]
    fn test_missing_endpoint() {
        let session = Session::new().unwrap();
        assert_eq!(
            session.get(BLOCK_STORAGE, &["volumes"]).unwrap_err().kind(),
            ErrorKind::EndpointNotFound
        );
    }

    #[test]
    fn test_microversion() {
        let mut session = Session::new()
            .unwrap()
            .with_endpoint(COMPUTE, "http://127.0.0.1:8774/v2.1")
            .unwrap()
            .with_endpoint(IMAGE, "http://127.0.0.1:9292/v2")
            .unwrap();
        session
            .set_microversion(COMPUTE, VersionRequest::Latest)
            .unwrap();
        assert_eq!(session.microversion(COMPUTE), Some(VersionRequest::Latest));
        session
            .set_microversion(COMPUTE, VersionRequest::default())
            .unwrap();
        assert_eq!(session.microversion(COMPUTE), None);
        assert_eq!(
            session
                .set_microversion(IMAGE, VersionRequest::Latest)
                .unwrap_err()
                .kind(),
            ErrorKind::IncompatibleApiVersion
        );
    }

    #[test]
    fn test_error_message() {
        let body = br#"{"itemNotFound": {"message": "Volume abcd could not be found.", "code": 404}}"#;
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, body),
            "Volume abcd could not be found."
        );
        let body = br#"{"NeutronError": {"type": "NetworkNotFound", "message": "Network 1 could not be found.", "detail": ""}}"#;
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, body),
            "Network 1 could not be found."
        );
        assert_eq!(
            error_message(StatusCode::CONFLICT, b"busy\n"),
            "busy"
        );
        assert_eq!(error_message(StatusCode::GONE, b""), "Gone");
    }
}
