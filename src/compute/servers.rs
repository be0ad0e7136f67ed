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

//! Server management via Compute API.
//!
//! # Examples
//!
//! ```rust,no_run
//! use tempest::compute::NewServer;
//! use tempest::waiter::Waiter;
//!
//! let session = tempest::Session::from_env().expect("Cannot create a session");
//! let mut server = NewServer::new(&session, "test-server", "1", "cirros-0.6")
//!     .with_auto_network()
//!     .create()
//!     .expect("Cannot request a server");
//! server
//!     .wait_for_status("ACTIVE")
//!     .wait()
//!     .expect("Server did not become active");
//! server
//!     .delete()
//!     .and_then(|waiter| waiter.wait())
//!     .expect("Server was not deleted");
//! ```

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use serde_json::json;

use super::super::service::COMPUTE;
use super::super::session::Session;
use super::super::utils::IntoId;
use super::super::waiter::{self, DeletionWaiter, StatusRequest, StatusWaiter, Waiter};
use super::super::{ErrorKind, Result};
use super::images::Image;
use super::{api, protocol};

/// Server statuses that fail a wait immediately.
pub const SERVER_FAILURE_STATUSES: [&str; 1] = ["ERROR"];

/// Structure representing a single server.
#[derive(Clone, Debug)]
pub struct Server {
    session: Session,
    inner: protocol::Server,
}

/// A request to create a server.
#[derive(Clone, Debug)]
pub struct NewServer {
    session: Session,
    inner: protocol::ServerCreate,
}

impl Display for Server {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "server {} ({}, {})",
            self.inner.id, self.inner.name, self.inner.status
        )
    }
}

impl Server {
    /// Fetch a server by its ID.
    pub fn new<Id: AsRef<str>>(session: &Session, id: Id) -> Result<Server> {
        let inner = api::get_server(session, id)?;
        Ok(Server {
            session: session.clone(),
            inner,
        })
    }

    transparent_property! {
        #[doc = "Server unique ID."]
        id: ref String
    }

    transparent_property! {
        #[doc = "Server name."]
        name: ref String
    }

    transparent_property! {
        #[doc = "Server status as of the last refresh."]
        status: ref String
    }

    transparent_property! {
        #[doc = "Current task (if any)."]
        task_state: ref Option<String>
    }

    transparent_property! {
        #[doc = "Addresses of the server per network."]
        addresses: ref HashMap<String, Vec<protocol::ServerAddress>>
    }

    transparent_property! {
        #[doc = "Fault information (only for failed servers)."]
        fault: ref Option<protocol::ServerFault>
    }

    transparent_property! {
        #[doc = "Server metadata."]
        metadata: ref HashMap<String, String>
    }

    /// Wait for the server to reach the status.
    ///
    /// Fails immediately if the server goes to `ERROR`.
    pub fn wait_for_status(
        &mut self,
        target: &str,
    ) -> StatusWaiter<impl FnMut() -> Result<String> + '_> {
        let policy = self.session.wait_policy(COMPUTE);
        waiter::resource_waiter(self, target, &SERVER_FAILURE_STATUSES, policy)
    }

    /// Reboot the server.
    pub fn reboot(&self, hard: bool) -> Result<()> {
        let kind = if hard { "HARD" } else { "SOFT" };
        api::server_action(&self.session, &self.inner.id, &json!({"reboot": {"type": kind}}))
    }

    /// Power off the server.
    pub fn stop(&self) -> Result<()> {
        api::server_action(&self.session, &self.inner.id, &json!({"os-stop": null}))
    }

    /// Power on the server.
    pub fn start(&self) -> Result<()> {
        api::server_action(&self.session, &self.inner.id, &json!({"os-start": null}))
    }

    /// Snapshot the server into an image.
    pub fn create_image<S: Into<String>>(&self, name: S) -> Result<Image> {
        let request = protocol::CreateImage {
            name: name.into(),
            metadata: HashMap::new(),
        };
        let image_id = api::create_image(&self.session, &self.inner.id, request)?;
        Image::new(&self.session, image_id)
    }

    /// Delete the server.
    ///
    /// Waiting on the result fails if the server goes to `ERROR`.
    pub fn delete(self) -> Result<DeletionWaiter<Server>> {
        api::delete_server(&self.session, &self.inner.id)?;
        let policy = self.session.wait_policy(COMPUTE);
        Ok(DeletionWaiter::new(self, policy).with_failure_statuses(SERVER_FAILURE_STATUSES))
    }
}

status_resource!(Server, "server", api::get_server);

impl NewServer {
    /// Start creating a server.
    pub fn new<N, F, I>(session: &Session, name: N, flavor: F, image: I) -> NewServer
    where
        N: Into<String>,
        F: IntoId,
        I: IntoId,
    {
        NewServer {
            session: session.clone(),
            inner: protocol::ServerCreate {
                name: name.into(),
                flavor_id: flavor.into_id(),
                image_id: image.into_id(),
                networks: None,
                key_name: None,
                availability_zone: None,
                metadata: HashMap::new(),
            },
        }
    }

    /// Request creation of the server.
    ///
    /// The API only returns the ID, so the server is fetched afterwards.
    pub fn create(self) -> Result<Server> {
        let id = api::create_server(&self.session, self.inner)?;
        Server::new(&self.session, id)
    }

    /// Attach the server to a network.
    pub fn add_network<Id: IntoId>(&mut self, network: Id) {
        let network = protocol::ServerNetwork {
            uuid: Some(network.into_id()),
            ..Default::default()
        };
        match self.inner.networks {
            Some(protocol::ServerNetworks::Explicit(ref mut list)) => list.push(network),
            _ => self.inner.networks = Some(protocol::ServerNetworks::Explicit(vec![network])),
        }
    }

    /// Attach the server to a network.
    #[inline]
    pub fn with_network<Id: IntoId>(mut self, network: Id) -> Self {
        self.add_network(network);
        self
    }

    /// Let the cloud pick a network (microversion 2.37 and newer).
    pub fn with_auto_network(mut self) -> Self {
        self.inner.networks = Some(protocol::ServerNetworks::Policy("auto".into()));
        self
    }

    /// Add a metadata item.
    pub fn with_metadata<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        let _ = self.inner.metadata.insert(key.into(), value.into());
        self
    }

    creation_inner_field! {
        #[doc = "Set the key pair name."]
        set_key_name, with_key_name -> key_name: optional String
    }

    creation_inner_field! {
        #[doc = "Set the availability zone."]
        set_availability_zone, with_availability_zone -> availability_zone: optional String
    }
}

/// Wait for a server to reach the status.
pub fn wait_for_server_status<Id: IntoId>(
    session: &Session,
    id: Id,
    target: &str,
) -> Result<String> {
    let id = id.into_id();
    let request = StatusRequest::new("server", id.as_str(), target)
        .with_failure_statuses(SERVER_FAILURE_STATUSES)
        .with_policy(session.wait_policy(COMPUTE));
    waiter::wait_for_status(request, || api::get_server(session, &id).map(|s| s.status))
}

/// Wait for a server to disappear.
///
/// A missing server counts as terminated, a server in `ERROR` fails the wait.
pub fn wait_for_server_termination<Id: IntoId>(session: &Session, id: Id) -> Result<()> {
    match Server::new(session, id.into_id()) {
        Ok(server) => {
            let policy = session.wait_policy(COMPUTE);
            DeletionWaiter::new(server, policy)
                .with_failure_statuses(SERVER_FAILURE_STATUSES)
                .wait()
        }
        Err(err) if err.kind() == ErrorKind::ResourceNotFound => Ok(()),
        Err(err) => Err(err),
    }
}
