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

//! Foundation bits exposing the Network API.
//!
//! All Network API resources follow the same pattern: a collection under a
//! plural name and a JSON body wrapped into an object keyed by the singular
//! (or the plural for collections) name. The generic functions here take the
//! resource name and are wrapped by explicitly named functions for the
//! resources the test suite uses.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::super::service::NETWORK;
use super::super::session::Session;
use super::super::{Error, ErrorKind, Result};
use super::protocol::*;

/// Collections served under an extension prefix.
const PREFIXES: &[(&str, &str)] = &[
    ("pools", "lb"),
    ("vips", "lb"),
    ("health_monitors", "lb"),
    ("members", "lb"),
    ("ipsecpolicies", "vpn"),
    ("vpnservices", "vpn"),
    ("ikepolicies", "vpn"),
    ("metering_labels", "metering"),
    ("metering_label_rules", "metering"),
    ("firewall_rules", "fw"),
    ("firewall_policies", "fw"),
    ("firewalls", "fw"),
];

/// Collections that keep underscores in their URL.
const HYPHEN_EXCEPTIONS: &[&str] = &["health_monitors", "firewall_rules", "firewall_policies"];

/// Irregular plurals.
const PLURALS: &[(&str, &str)] = &[
    ("security_groups", "security_groups"),
    ("security_group_rules", "security_group_rules"),
    ("ipsecpolicy", "ipsecpolicies"),
    ("ikepolicy", "ikepolicies"),
    ("quotas", "quotas"),
    ("firewall_policy", "firewall_policies"),
];

/// Plural (collection) name of a resource.
pub fn pluralize(resource: &str) -> String {
    PLURALS
        .iter()
        .find(|(singular, _)| *singular == resource)
        .map(|(_, plural)| plural.to_string())
        .unwrap_or_else(|| format!("{}s", resource))
}

/// URL path segments of a collection.
pub fn collection_path(plural: &str) -> Vec<String> {
    let name = if HYPHEN_EXCEPTIONS.contains(&plural) {
        plural.to_string()
    } else {
        plural.replace('_', "-")
    };
    match PREFIXES.iter().find(|(key, _)| *key == plural) {
        Some((_, prefix)) => vec![prefix.to_string(), name],
        None => vec![name],
    }
}

fn resource_path(resource: &str, id: &str) -> Vec<String> {
    let mut path = collection_path(&pluralize(resource));
    path.push(id.to_string());
    path
}

fn wrap<B: Serialize + ?Sized>(key: &str, body: &B) -> Result<Value> {
    let mut root = Map::new();
    let _ = root.insert(key.to_string(), serde_json::to_value(body)?);
    Ok(Value::Object(root))
}

fn unwrap<T: DeserializeOwned>(key: &str, mut root: Value) -> Result<T> {
    match root.get_mut(key).map(Value::take) {
        Some(value) => Ok(serde_json::from_value(value)?),
        None => Err(Error::new(
            ErrorKind::InvalidResponse,
            format!("Response does not contain the {} key", key),
        )),
    }
}

/// List resources of a collection.
pub fn list_resources<T, Q>(session: &Session, plural: &str, query: &Q) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    Q: Serialize + Debug + ?Sized,
{
    trace!("Listing {} with {:?}", plural, query);
    let root: Value = session
        .get(NETWORK, collection_path(plural))?
        .query(query)
        .expect_status(200)
        .fetch()?;
    let result = unwrap(plural, root)?;
    trace!("Received {}", plural);
    Ok(result)
}

/// Get a resource by its ID.
pub fn show_resource<T: DeserializeOwned, S: AsRef<str>>(
    session: &Session,
    resource: &str,
    id: S,
) -> Result<T> {
    trace!("Fetching {} {}", resource, id.as_ref());
    let root: Value = session
        .get(NETWORK, resource_path(resource, id.as_ref()))?
        .expect_status(200)
        .fetch()?;
    trace!("Received {:?}", root);
    unwrap(resource, root)
}

/// Create a resource.
pub fn create_resource<T, B>(session: &Session, resource: &str, body: &B) -> Result<T>
where
    T: DeserializeOwned,
    B: Serialize + Debug + ?Sized,
{
    debug!("Creating a new {} with {:?}", resource, body);
    let root: Value = session
        .post(NETWORK, collection_path(&pluralize(resource)))?
        .json(&wrap(resource, body)?)
        .expect_status(201)
        .fetch()?;
    debug!("Created {} {:?}", resource, root);
    unwrap(resource, root)
}

/// Create several resources in one request.
pub fn create_bulk_resources<T, B>(
    session: &Session,
    resource: &str,
    bodies: &[B],
) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    B: Serialize + Debug,
{
    let plural = pluralize(resource);
    debug!("Creating {} {} with {:?}", bodies.len(), plural, bodies);
    let root: Value = session
        .post(NETWORK, collection_path(&plural))?
        .json(&wrap(&plural, &bodies)?)
        .expect_status(201)
        .fetch()?;
    debug!("Created {} {}", bodies.len(), plural);
    unwrap(&plural, root)
}

/// Update a resource.
pub fn update_resource<T, B, S>(session: &Session, resource: &str, id: S, body: &B) -> Result<T>
where
    T: DeserializeOwned,
    B: Serialize + Debug + ?Sized,
    S: AsRef<str>,
{
    debug!("Updating {} {} with {:?}", resource, id.as_ref(), body);
    let root: Value = session
        .put(NETWORK, resource_path(resource, id.as_ref()))?
        .json(&wrap(resource, body)?)
        .expect_status(200)
        .fetch()?;
    debug!("Updated {} {}", resource, id.as_ref());
    unwrap(resource, root)
}

/// Delete a resource.
pub fn delete_resource<S: AsRef<str>>(session: &Session, resource: &str, id: S) -> Result<()> {
    trace!("Deleting {} {}", resource, id.as_ref());
    let _ = session
        .delete(NETWORK, resource_path(resource, id.as_ref()))?
        .expect_status(204)
        .send()?;
    debug!("Successfully requested deletion of {} {}", resource, id.as_ref());
    Ok(())
}

macro_rules! named_crud {
    (
        $resource:literal,
        $type:ty,
        $create:ident,
        $show:ident,
        $list:ident,
        $update:ident,
        $delete:ident
    ) => (
        #[doc = concat!("Create a ", $resource, ".")]
        pub fn $create<B>(session: &Session, body: &B) -> Result<$type>
        where
            B: Serialize + Debug + ?Sized,
        {
            create_resource(session, $resource, body)
        }

        #[doc = concat!("Get a ", $resource, " by its ID.")]
        pub fn $show<S: AsRef<str>>(session: &Session, id: S) -> Result<$type> {
            show_resource(session, $resource, id)
        }

        #[doc = concat!("List ", $resource, " resources.")]
        pub fn $list<Q>(session: &Session, query: &Q) -> Result<Vec<$type>>
        where
            Q: Serialize + Debug + ?Sized,
        {
            list_resources(session, &pluralize($resource), query)
        }

        #[doc = concat!("Update a ", $resource, ".")]
        pub fn $update<S, B>(session: &Session, id: S, body: &B) -> Result<$type>
        where
            S: AsRef<str>,
            B: Serialize + Debug + ?Sized,
        {
            update_resource(session, $resource, id, body)
        }

        #[doc = concat!("Delete a ", $resource, ".")]
        pub fn $delete<S: AsRef<str>>(session: &Session, id: S) -> Result<()> {
            delete_resource(session, $resource, id)
        }
    );
}

named_crud!(
    "network",
    Network,
    create_network,
    show_network,
    list_networks,
    update_network,
    delete_network
);
named_crud!(
    "subnet",
    Subnet,
    create_subnet,
    show_subnet,
    list_subnets,
    update_subnet,
    delete_subnet
);
named_crud!("port", Port, create_port, show_port, list_ports, update_port, delete_port);
named_crud!(
    "router",
    Router,
    create_router,
    show_router,
    list_routers,
    update_router,
    delete_router
);
named_crud!(
    "floatingip",
    FloatingIp,
    create_floating_ip,
    show_floating_ip,
    list_floating_ips,
    update_floating_ip,
    delete_floating_ip
);

/// Create several networks in one request.
pub fn create_bulk_networks<B: Serialize + Debug>(
    session: &Session,
    bodies: &[B],
) -> Result<Vec<Network>> {
    create_bulk_resources(session, "network", bodies)
}

/// Create several subnets in one request.
pub fn create_bulk_subnets<B: Serialize + Debug>(
    session: &Session,
    bodies: &[B],
) -> Result<Vec<Subnet>> {
    create_bulk_resources(session, "subnet", bodies)
}

/// Create several ports in one request.
pub fn create_bulk_ports<B: Serialize + Debug>(
    session: &Session,
    bodies: &[B],
) -> Result<Vec<Port>> {
    create_bulk_resources(session, "port", bodies)
}

fn router_interface<S: AsRef<str>>(
    session: &Session,
    id: S,
    action: &str,
    subnet_id: &str,
) -> Result<()> {
    trace!("Running {} on router {} for subnet {}", action, id.as_ref(), subnet_id);
    let _ = session
        .put(NETWORK, &["routers", id.as_ref(), action])?
        .json(&serde_json::json!({ "subnet_id": subnet_id }))
        .expect_status(200)
        .send()?;
    debug!("Successfully ran {} on router {}", action, id.as_ref());
    Ok(())
}

/// Add a subnet interface to a router.
pub fn add_router_interface<S: AsRef<str>>(
    session: &Session,
    id: S,
    subnet_id: &str,
) -> Result<()> {
    router_interface(session, id, "add_router_interface", subnet_id)
}

/// Remove a subnet interface from a router.
pub fn remove_router_interface<S: AsRef<str>>(
    session: &Session,
    id: S,
    subnet_id: &str,
) -> Result<()> {
    router_interface(session, id, "remove_router_interface", subnet_id)
}

#[cfg(test)]
pub mod test {
    #![allow(missing_docs)]

    use super::{collection_path, pluralize};

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("network"), "networks");
        assert_eq!(pluralize("floatingip"), "floatingips");
        assert_eq!(pluralize("security_groups"), "security_groups");
        assert_eq!(pluralize("ikepolicy"), "ikepolicies");
        assert_eq!(pluralize("firewall_policy"), "firewall_policies");
    }

    #[test]
    fn test_collection_path_plain() {
        assert_eq!(collection_path("networks"), vec!["networks"]);
        assert_eq!(collection_path("security_groups"), vec!["security-groups"]);
        assert_eq!(
            collection_path("security_group_rules"),
            vec!["security-group-rules"]
        );
    }

    #[test]
    fn test_collection_path_prefixed() {
        assert_eq!(collection_path("pools"), vec!["lb", "pools"]);
        assert_eq!(
            collection_path("health_monitors"),
            vec!["lb", "health_monitors"]
        );
        assert_eq!(collection_path("ikepolicies"), vec!["vpn", "ikepolicies"]);
        assert_eq!(
            collection_path("metering_label_rules"),
            vec!["metering", "metering-label-rules"]
        );
        assert_eq!(
            collection_path("firewall_policies"),
            vec!["fw", "firewall_policies"]
        );
    }

    #[test]
    fn test_collection_path_unknown_extension() {
        assert_eq!(pluralize("ipsec_site_connection"), "ipsec_site_connections");
        assert_eq!(
            collection_path("ipsec_site_connections"),
            vec!["ipsec-site-connections"]
        );
    }
}
