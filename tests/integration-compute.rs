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

use std::sync::Once;
use std::time::Duration;

use serde_json::json;
use tokio::runtime::Runtime;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tempest::compute::{wait_for_server_status, wait_for_server_termination, NewServer, Server};
use tempest::service::COMPUTE;
use tempest::{ApiVersion, ErrorKind, Session, VersionRequest, WaitPolicy, Waiter};

static INIT: Once = Once::new();

const NOVA_HEADER: &str = "X-OpenStack-Nova-API-Version";

struct FakeCloud {
    runtime: Runtime,
    server: MockServer,
}

impl FakeCloud {
    fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    fn session(&self) -> Session {
        Session::new()
            .expect("Cannot create a session")
            .with_token("secret")
            .with_endpoint(COMPUTE, format!("{}/v2.1", self.server.uri()))
            .expect("Invalid endpoint")
            .with_wait_policy(
                COMPUTE,
                WaitPolicy::new(Duration::from_millis(10), Duration::from_secs(5)),
            )
            .expect("Unknown service")
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

fn server(id: &str, status: &str) -> serde_json::Value {
    json!({"server": {
        "id": id,
        "name": "test-server",
        "status": status,
        "OS-EXT-STS:task_state": null,
        "addresses": {}
    }})
}

fn ok(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_json(body)
        .insert_header(NOVA_HEADER, "2.45")
}

#[test]
fn test_server_boot_snapshot_delete() {
    let cloud = set_up();
    cloud.mount(
        Mock::given(method("POST"))
            .and(path("/v2.1/servers"))
            .and(header(NOVA_HEADER, "2.45"))
            .and(body_partial_json(json!({"server": {
                "name": "test-server",
                "flavorRef": "1",
                "imageRef": "img-1",
                "networks": "auto"
            }})))
            .respond_with(
                ResponseTemplate::new(202)
                    .set_body_json(json!({"server": {"id": "srv-1", "adminPass": "pass"}}))
                    .insert_header(NOVA_HEADER, "2.45"),
            ),
    );
    cloud.mount(
        Mock::given(method("GET"))
            .and(path("/v2.1/servers/srv-1"))
            .respond_with(ok(server("srv-1", "BUILD")))
            .up_to_n_times(2)
            .with_priority(1),
    );
    cloud.mount(
        Mock::given(method("GET"))
            .and(path("/v2.1/servers/srv-1"))
            .respond_with(ok(server("srv-1", "ACTIVE")))
            .up_to_n_times(2)
            .with_priority(2),
    );
    cloud.mount(
        Mock::given(method("POST"))
            .and(path("/v2.1/servers/srv-1/action"))
            .and(body_partial_json(json!({"createImage": {"name": "snap"}})))
            .respond_with(
                ResponseTemplate::new(202)
                    .set_body_json(json!({"image_id": "snap-1"}))
                    .insert_header(NOVA_HEADER, "2.45"),
            ),
    );
    cloud.mount(
        Mock::given(method("GET"))
            .and(path("/v2.1/images/snap-1"))
            .respond_with(ok(json!({
                "image": {"id": "snap-1", "name": "snap", "status": "SAVING", "progress": 25}
            })))
            .up_to_n_times(2)
            .with_priority(1),
    );
    cloud.mount(
        Mock::given(method("GET"))
            .and(path("/v2.1/images/snap-1"))
            .respond_with(ok(json!({
                "image": {"id": "snap-1", "name": "snap", "status": "ACTIVE", "progress": 100}
            })))
            .with_priority(2),
    );
    cloud.mount(
        Mock::given(method("DELETE"))
            .and(path("/v2.1/servers/srv-1"))
            .respond_with(ResponseTemplate::new(204).insert_header(NOVA_HEADER, "2.45"))
            .expect(1),
    );

    let session = cloud
        .session()
        .with_microversion(COMPUTE, VersionRequest::Version(ApiVersion(2, 45)))
        .expect("Cannot set microversion");

    let mut server = NewServer::new(&session, "test-server", "1", "img-1")
        .with_auto_network()
        .create()
        .expect("Cannot create a server");
    assert_eq!(server.status(), "BUILD");

    let _ = server
        .wait_for_status("ACTIVE")
        .wait()
        .expect("Server did not become active");
    assert_eq!(server.status(), "ACTIVE");

    let mut image = server.create_image("snap").expect("Cannot create an image");
    assert_eq!(image.id(), "snap-1");
    let _ = image
        .wait_for_status("ACTIVE")
        .wait()
        .expect("Image did not become active");
    assert_eq!(image.progress(), Some(100));

    // The remaining GET returns ACTIVE once, then the server is gone.
    server
        .delete()
        .expect("Cannot delete the server")
        .wait()
        .expect("Server was not deleted");
}

#[test]
fn test_server_error_fails_fast() {
    let cloud = set_up();
    cloud.mount(
        Mock::given(method("GET"))
            .and(path("/v2.1/servers/srv-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"server": {
                "id": "srv-2",
                "name": "test-server",
                "status": "ERROR",
                "fault": {"code": 500, "message": "No valid host was found."}
            }}))),
    );

    let session = cloud.session();
    let err = wait_for_server_status(&session, "srv-2", "ACTIVE").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OperationFailed);
    assert_eq!(
        err.wait_context().map(|c| c.resource_type.as_str()),
        Some("server")
    );

    let server = Server::new(&session, "srv-2").expect("Cannot fetch the server");
    assert_eq!(
        server.fault().as_ref().map(|f| f.message.as_str()),
        Some("No valid host was found.")
    );
}

#[test]
fn test_server_termination() {
    let cloud = set_up();
    cloud.mount(
        Mock::given(method("GET"))
            .and(path("/v2.1/servers/srv-3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(server("srv-3", "ACTIVE")))
            .up_to_n_times(2),
    );

    let session = cloud.session();
    wait_for_server_termination(&session, "srv-3").expect("Server was not terminated");
    wait_for_server_termination(&session, "srv-missing").expect("Missing server is terminated");
}

#[test]
fn test_server_termination_error() {
    let cloud = set_up();
    cloud.mount(
        Mock::given(method("GET"))
            .and(path("/v2.1/servers/srv-4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(server("srv-4", "ERROR"))),
    );

    let session = cloud.session();
    let err = wait_for_server_termination(&session, "srv-4").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OperationFailed);
}

#[test]
fn test_microversion_mismatch() {
    let cloud = set_up();
    cloud.mount(
        Mock::given(method("GET"))
            .and(path("/v2.1/servers/srv-5"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(server("srv-5", "ACTIVE"))
                    .insert_header(NOVA_HEADER, "2.1"),
            ),
    );

    let session = cloud
        .session()
        .with_microversion(COMPUTE, VersionRequest::Version(ApiVersion(2, 45)))
        .expect("Cannot set microversion");
    let err = wait_for_server_status(&session, "srv-5", "ACTIVE").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
}
