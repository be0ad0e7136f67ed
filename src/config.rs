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

//! Support for the test suite configuration file.
//!
//! The configuration is a YAML file with one section per service:
//!
//! ```yaml
//! auth:
//!   token: gAAAAABj...
//! compute:
//!   endpoint: https://cloud.example.com/compute/v2.1
//!   build_interval: 1
//!   build_timeout: 196
//!   min_microversion: "2.1"
//!   max_microversion: latest
//! volume:
//!   endpoint: https://cloud.example.com/volume/v3/3f2c
//! ```
//!
//! Nothing here is global: the loaded `Config` is passed to a
//! [Session](../session/struct.Session.html), which hands the per-service
//! wait policies to the waiters.

use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::common::VersionRequest;
use super::service::ServiceType;
use super::waiter::WaitPolicy;
use super::{Error, ErrorKind, Result};

/// Environment variable pointing to the configuration file.
pub const CONFIG_ENV: &str = "TEMPEST_CONFIG";

/// Environment variable with an authentication token.
pub const TOKEN_ENV: &str = "OS_TOKEN";

/// Authentication settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Pre-issued authentication token.
    #[serde(default)]
    pub token: Option<String>,
}

/// Settings of one service.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the service, including the version prefix.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Seconds between two status checks.
    #[serde(default = "default_build_interval")]
    pub build_interval: u64,
    /// Seconds to wait for a resource to reach a status.
    #[serde(default = "default_build_timeout")]
    pub build_timeout: u64,
    /// Minimum microversion supported by the cloud.
    #[serde(default)]
    pub min_microversion: Option<VersionRequest>,
    /// Maximum microversion supported by the cloud.
    #[serde(default)]
    pub max_microversion: Option<VersionRequest>,
}

/// Test suite configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Authentication.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Compute service.
    #[serde(default)]
    pub compute: ServiceConfig,
    /// Block storage service.
    #[serde(default)]
    pub volume: ServiceConfig,
    /// Image service.
    #[serde(default)]
    pub image: ServiceConfig,
    /// Network service.
    #[serde(default)]
    pub network: ServiceConfig,
    /// Identity service.
    #[serde(default)]
    pub identity: ServiceConfig,
    /// Object storage service.
    #[serde(default)]
    pub object_storage: ServiceConfig,
}

fn default_build_interval() -> u64 {
    WaitPolicy::DEFAULT_INTERVAL.as_secs()
}

fn default_build_timeout() -> u64 {
    WaitPolicy::DEFAULT_TIMEOUT.as_secs()
}

fn find_config() -> Option<PathBuf> {
    let current = Path::new("./tempest.yaml");
    if current.is_file() {
        match current.canonicalize() {
            Ok(val) => return Some(val),
            Err(e) => warn!("Cannot canonicalize {:?}: {}", current, e),
        }
    }

    let abs = PathBuf::from("/etc/tempest/tempest.yaml");
    if abs.is_file() {
        Some(abs)
    } else {
        None
    }
}

impl Default for ServiceConfig {
    fn default() -> ServiceConfig {
        ServiceConfig {
            endpoint: None,
            build_interval: default_build_interval(),
            build_timeout: default_build_timeout(),
            min_microversion: None,
            max_microversion: None,
        }
    }
}

impl ServiceConfig {
    /// Polling interval and timeout for this service.
    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_secs(self.build_interval),
            Duration::from_secs(self.build_timeout),
        )
    }

    /// Configured microversion range, `0.0` meaning "not set".
    pub fn microversion_range(&self) -> (VersionRequest, VersionRequest) {
        (
            self.min_microversion.unwrap_or_default(),
            self.max_microversion.unwrap_or_default(),
        )
    }
}

impl Config {
    /// Parse configuration from a YAML string.
    pub fn from_yaml<S: AsRef<str>>(source: S) -> Result<Config> {
        let config: Config = serde_yaml::from_str(source.as_ref())?;
        config.validate()
    }

    /// Load configuration from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        debug!("Loading configuration from {:?}", path);
        let file = File::open(path).map_err(|e| {
            Error::new(
                ErrorKind::InvalidConfig,
                format!("Cannot read {:?}: {}", path, e),
            )
        })?;
        let config: Config = serde_yaml::from_reader(file)?;
        config.validate()
    }

    /// Load configuration using environment variables.
    ///
    /// The file is taken from `TEMPEST_CONFIG`, then `./tempest.yaml`, then
    /// `/etc/tempest/tempest.yaml`. `OS_TOKEN` overrides the token.
    pub fn from_env() -> Result<Config> {
        let path = match env::var_os(CONFIG_ENV) {
            Some(value) => PathBuf::from(value),
            None => find_config().ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidConfig,
                    "tempest.yaml was not found in any location",
                )
            })?,
        };

        let mut config = Config::from_file(path)?;
        if let Ok(token) = env::var(TOKEN_ENV) {
            config.auth.token = Some(token);
        }
        Ok(config)
    }

    /// Settings for the given service.
    pub fn service(&self, service: ServiceType) -> &ServiceConfig {
        match service.config_section() {
            "compute" => &self.compute,
            "volume" => &self.volume,
            "image" => &self.image,
            "network" => &self.network,
            "identity" => &self.identity,
            _ => &self.object_storage,
        }
    }

    fn validate(self) -> Result<Config> {
        for service in super::service::ALL {
            let section = self.service(service);
            if section.build_interval == 0 {
                return Err(Error::new(
                    ErrorKind::InvalidConfig,
                    format!("build_interval of {} must be positive", service.config_section()),
                ));
            }

            let (min, max) = section.microversion_range();
            if section.max_microversion.is_some() && min > max {
                return Err(Error::new(
                    ErrorKind::InvalidConfig,
                    format!(
                        "Invalid microversion range [{} - {}] for {}",
                        min,
                        max,
                        service.config_section()
                    ),
                ));
            }
        }

        Ok(self)
    }
}
