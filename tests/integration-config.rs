// Copyright 2024 Dmitry Tantsur <divius.inside@gmail.com>
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

use std::io::Write;
use std::sync::Once;
use std::time::Duration;

use serde_json::json;
use tokio::runtime::Runtime;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tempest::compute::wait_for_server_status;
use tempest::network::wait_for_resource_status;
use tempest::service::{BLOCK_STORAGE, COMPUTE, NETWORK};
use tempest::{ApiVersion, Config, ErrorKind, Session, VersionRequest, WaitPolicy};

static INIT: Once = Once::new();

struct FakeCloud {
    runtime: Runtime,
    server: MockServer,
}

impl FakeCloud {
    fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    fn config(&self) -> tempfile::NamedTempFile {
        let uri = self.server.uri();
        let mut file = tempfile::NamedTempFile::new().expect("Cannot create a file");
        write!(
            file,
            "auth:\n  token: from-config\n\
             compute:\n  endpoint: {uri}/v2.1\n  \
             min_microversion: \"2.10\"\n  max_microversion: latest\n\
             network:\n  endpoint: {uri}/v2.0\n  build_interval: 1\n  build_timeout: 1\n"
        )
        .expect("Cannot write configuration");
        file
    }
}

fn set_up() -> FakeCloud {
    INIT.call_once(|| {
        env_logger::init();
    });

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Cannot create a runtime");
    let server = runtime.block_on(MockServer::start());
    FakeCloud { runtime, server }
}

#[test]
fn test_session_from_config() {
    let cloud = set_up();
    let file = cloud.config();
    let config = Config::from_file(file.path()).expect("Cannot load configuration");
    let session = Session::from_config(&config).expect("Cannot create a session");

    assert_eq!(
        session.wait_policy(NETWORK),
        WaitPolicy::new(Duration::from_secs(1), Duration::from_secs(1))
    );
    assert_eq!(session.wait_policy(COMPUTE), WaitPolicy::default());
    assert_eq!(session.wait_policy(BLOCK_STORAGE), WaitPolicy::default());
    assert_eq!(
        session.microversion(COMPUTE),
        Some(VersionRequest::Version(ApiVersion(2, 10)))
    );
}

#[test]
fn test_configured_token_and_microversion() {
    let cloud = set_up();
    cloud.mount(
        Mock::given(method("GET"))
            .and(path("/v2.1/servers/srv-1"))
            .and(header("X-Auth-Token", "from-config"))
            .and(header("X-OpenStack-Nova-API-Version", "2.10"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-OpenStack-Nova-API-Version", "2.10")
                    .set_body_json(json!({"server": {
                        "id": "srv-1",
                        "name": "test",
                        "status": "ACTIVE"
                    }})),
            ),
    );

    let file = cloud.config();
    let config = Config::from_file(file.path()).expect("Cannot load configuration");
    let session = Session::from_config(&config).expect("Cannot create a session");
    let status =
        wait_for_server_status(&session, "srv-1", "ACTIVE").expect("Server is not active");
    assert_eq!(status, "ACTIVE");
}

#[test]
fn test_configured_timeout() {
    let cloud = set_up();
    cloud.mount(
        Mock::given(method("GET"))
            .and(path("/v2.0/ports/port-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"port": {
                "id": "port-1",
                "network_id": "net-1",
                "status": "DOWN"
            }}))),
    );

    let file = cloud.config();
    let config = Config::from_file(file.path()).expect("Cannot load configuration");
    let session = Session::from_config(&config).expect("Cannot create a session");
    let err = wait_for_resource_status(&session, "port", "port-1", "ACTIVE").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OperationTimedOut);

    let context = err.wait_context().expect("No wait context");
    assert_eq!(context.resource_type, "port");
    assert_eq!(context.target.as_deref(), Some("ACTIVE"));
    assert_eq!(context.last_status.as_deref(), Some("DOWN"));
    assert!(context.elapsed.expect("No elapsed time") >= Duration::from_secs(1));
}

#[test]
fn test_missing_config_file() {
    let err = Config::from_file("/nonexistent/tempest.yaml").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
}

#[test]
fn test_invalid_microversion_range() {
    let mut file = tempfile::NamedTempFile::new().expect("Cannot create a file");
    file.write_all(b"compute:\n  min_microversion: \"2.50\"\n  max_microversion: \"2.1\"\n")
        .expect("Cannot write configuration");
    let err = Config::from_file(file.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
}
