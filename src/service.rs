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

//! Service types known to the test suite.

use std::fmt;

/// A service type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServiceType {
    catalog_type: &'static str,
    config_section: &'static str,
    version_header: Option<&'static str>,
    version_prefix: &'static str,
}

/// Compute service (Nova).
pub const COMPUTE: ServiceType = ServiceType {
    catalog_type: "compute",
    config_section: "compute",
    version_header: Some("X-OpenStack-Nova-API-Version"),
    version_prefix: "",
};

/// Block storage service (Cinder).
pub const BLOCK_STORAGE: ServiceType = ServiceType {
    catalog_type: "volumev3",
    config_section: "volume",
    version_header: Some("OpenStack-API-Version"),
    version_prefix: "volume ",
};

/// Image service (Glance).
pub const IMAGE: ServiceType = ServiceType {
    catalog_type: "image",
    config_section: "image",
    version_header: None,
    version_prefix: "",
};

/// Network service (Neutron).
pub const NETWORK: ServiceType = ServiceType {
    catalog_type: "network",
    config_section: "network",
    version_header: None,
    version_prefix: "",
};

/// Identity service (Keystone).
pub const IDENTITY: ServiceType = ServiceType {
    catalog_type: "identity",
    config_section: "identity",
    version_header: None,
    version_prefix: "",
};

/// Object storage service (Swift).
pub const OBJECT_STORAGE: ServiceType = ServiceType {
    catalog_type: "object-store",
    config_section: "object_storage",
    version_header: None,
    version_prefix: "",
};

/// All known service types.
pub const ALL: [ServiceType; 6] = [
    COMPUTE,
    BLOCK_STORAGE,
    IMAGE,
    NETWORK,
    IDENTITY,
    OBJECT_STORAGE,
];

impl ServiceType {
    /// Service type as used in the service catalog.
    #[inline]
    pub fn catalog_type(&self) -> &'static str {
        self.catalog_type
    }

    /// Name of the configuration section for this service.
    #[inline]
    pub fn config_section(&self) -> &'static str {
        self.config_section
    }

    /// Header used for microversion negotiation (if supported).
    #[inline]
    pub fn version_header(&self) -> Option<&'static str> {
        self.version_header
    }

    /// Value of the microversion header for the given version.
    pub fn version_header_value<D: fmt::Display>(&self, version: D) -> String {
        format!("{}{}", self.version_prefix, version)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.catalog_type)
    }
}
