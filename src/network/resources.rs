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

//! Generic Network API resource handle.

use std::fmt::{self, Display, Formatter};

use serde_json::Value;

use super::super::common::{Refresh, Resource};
use super::super::service::NETWORK;
use super::super::session::Session;
use super::super::utils::IntoId;
use super::super::waiter::{self, DeletionWaiter, StatusWaiter, Waiter};
use super::super::{ErrorKind, Result};
use super::api;

/// Any Network API resource, identified by its singular name and ID.
#[derive(Clone, Debug)]
pub struct NetworkResource {
    session: Session,
    resource: &'static str,
    id: String,
    body: Value,
}

impl Display for NetworkResource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.resource, self.id)
    }
}

impl NetworkResource {
    /// Fetch a resource, e.g. `NetworkResource::new(&session, "port", id)`.
    pub fn new<Id: IntoId>(
        session: &Session,
        resource: &'static str,
        id: Id,
    ) -> Result<NetworkResource> {
        let id = id.into_id();
        let body = api::show_resource(session, resource, &id)?;
        Ok(NetworkResource {
            session: session.clone(),
            resource,
            id,
            body,
        })
    }

    /// Resource ID.
    #[inline]
    pub fn id(&self) -> &String {
        &self.id
    }

    /// JSON representation as of the last refresh.
    #[inline]
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Wait for the resource to reach the status.
    pub fn wait_for_status(
        &mut self,
        target: &str,
    ) -> StatusWaiter<impl FnMut() -> Result<String> + '_> {
        let policy = self.session.wait_policy(NETWORK);
        waiter::resource_waiter(self, target, &[], policy)
    }

    /// Delete the resource.
    pub fn delete(self) -> Result<DeletionWaiter<NetworkResource>> {
        api::delete_resource(&self.session, self.resource, &self.id)?;
        let policy = self.session.wait_policy(NETWORK);
        Ok(DeletionWaiter::new(self, policy))
    }
}

impl Refresh for NetworkResource {
    fn refresh(&mut self) -> Result<()> {
        self.body = api::show_resource(&self.session, self.resource, &self.id)?;
        Ok(())
    }
}

impl Resource for NetworkResource {
    fn resource_type(&self) -> &'static str {
        self.resource
    }

    fn resource_id(&self) -> &str {
        &self.id
    }

    fn current_status(&self) -> Option<&str> {
        self.body.get("status").and_then(Value::as_str)
    }
}

/// Wait for a Network API resource to reach the status.
pub fn wait_for_resource_status<Id: IntoId>(
    session: &Session,
    resource: &'static str,
    id: Id,
    target: &str,
) -> Result<String> {
    let mut handle = NetworkResource::new(session, resource, id)?;
    handle.wait_for_status(target).wait()
}

/// Wait for a Network API resource to disappear.
///
/// A resource that is already missing counts as deleted.
pub fn wait_for_resource_deletion<Id: IntoId>(
    session: &Session,
    resource: &'static str,
    id: Id,
) -> Result<()> {
    match NetworkResource::new(session, resource, id) {
        Ok(handle) => {
            let policy = session.wait_policy(NETWORK);
            DeletionWaiter::new(handle, policy).wait()
        }
        Err(err) if err.kind() == ErrorKind::ResourceNotFound => Ok(()),
        Err(err) => Err(err),
    }
}
