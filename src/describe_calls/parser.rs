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

//! Extraction of HTTP calls from log lines.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::super::{Error, ErrorKind, Result};

const REQUEST_LINE: &str =
    r".*INFO.*Request \((?P<name>.*)\): (?P<code>[\d]{3}) (?P<verb>\w*) (?P<url>.*) .*";
const PORT: &str = r".*:(?P<port>\d+).*";
const PATH: &str = r"^http[s]?://[^/]*/(?P<path>.*)";
const UUID: &str =
    r"(^|[^0-9a-f])[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}([^0-9a-f]|$)";
const ID: &str = r"(^|[^0-9a-z])[0-9a-z]{8}[0-9a-z]{4}[0-9a-z]{4}[0-9a-z]{4}[0-9a-z]{12}([^0-9a-z]|$)";
const IP: &str = r"(^|[^0-9])[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}([^0-9]|$)";

/// Service name reported when the port is not known.
pub const UNKNOWN_SERVICE: &str = "Unknown";

/// Default mapping of ports to service names.
pub const DEFAULT_PORTS: &[(&str, &str)] = &[
    ("8776", "Block Storage"),
    ("8774", "Nova"),
    ("8773", "Nova-API"),
    ("8775", "Nova-API"),
    ("8386", "Sahara"),
    ("35357", "Keystone"),
    ("5000", "Keystone"),
    ("9292", "Glance"),
    ("9191", "Glance"),
    ("9696", "Neutron"),
    ("6000", "Swift"),
    ("6001", "Swift"),
    ("6002", "Swift"),
    ("8004", "Heat"),
    ("8000", "Heat"),
    ("8003", "Heat"),
    ("8777", "Ceilometer"),
    ("80", "Horizon"),
    ("8080", "Swift"),
    ("443", "SSL"),
    ("873", "rsync"),
    ("3260", "iSCSI"),
    ("3306", "MySQL"),
    ("5672", "AMQP"),
];

/// A single HTTP call made by a test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// `Class.method` of the client that made the call.
    pub name: String,
    /// HTTP verb.
    pub verb: String,
    /// Service name derived from the port.
    pub service: String,
    /// Shortened URL path.
    pub url: String,
    /// Response status code as logged.
    pub status_code: String,
}

/// Parser turning log text into calls.
#[derive(Debug, Clone)]
pub struct CallParser {
    services: HashMap<String, String>,
    request_line: Regex,
    port: Regex,
    path: Regex,
    uuid: Regex,
    id: Regex,
    ip: Regex,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::new(ErrorKind::InvalidInput, e.to_string()))
}

/// Default port to service mapping.
pub fn default_ports() -> HashMap<String, String> {
    DEFAULT_PORTS
        .iter()
        .map(|(port, name)| (port.to_string(), name.to_string()))
        .collect()
}

/// Load a port to service mapping from a JSON file.
pub fn load_ports<P: AsRef<Path>>(path: P) -> Result<HashMap<String, String>> {
    let path = path.as_ref();
    debug!("Loading service ports from {}", path.display());
    let content = fs::read_to_string(path).map_err(|e| {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("Cannot read ports file {}: {}", path.display(), e),
        )
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::new(
            ErrorKind::InvalidConfig,
            format!("Cannot parse ports file {}: {}", path.display(), e),
        )
    })
}

impl CallParser {
    /// Create a parser with the default port mapping.
    pub fn new() -> Result<CallParser> {
        CallParser::with_services(default_ports())
    }

    /// Create a parser with a custom port mapping.
    pub fn with_services(services: HashMap<String, String>) -> Result<CallParser> {
        Ok(CallParser {
            services,
            request_line: compile(REQUEST_LINE)?,
            port: compile(PORT)?,
            path: compile(PATH)?,
            uuid: compile(UUID)?,
            id: compile(ID)?,
            ip: compile(IP)?,
        })
    }

    /// Parse one log line.
    pub fn parse_line(&self, line: &str) -> Option<Call> {
        let caps = self.request_line.captures(line)?;
        let url = &caps["url"];
        Some(Call {
            name: caps["name"].to_string(),
            verb: caps["verb"].to_string(),
            service: self.service(url).to_string(),
            url: self.url_path(url),
            status_code: caps["code"].to_string(),
        })
    }

    /// Parse a whole log, keeping the order of calls.
    pub fn parse(&self, text: &str) -> Vec<Call> {
        text.split('\n').filter_map(|line| self.parse_line(line)).collect()
    }

    /// Service name for the URL, judging by its port.
    pub fn service(&self, url: &str) -> &str {
        self.port
            .captures(url)
            .and_then(|caps| self.services.get(&caps["port"]))
            .map(String::as_str)
            .unwrap_or(UNKNOWN_SERVICE)
    }

    /// Path of the URL with identifiers replaced by placeholders.
    pub fn url_path(&self, url: &str) -> String {
        match self.path.captures(url) {
            Some(caps) => {
                let path = self.uuid.replace_all(&caps["path"], "${1}<uuid>${2}");
                let path = self.ip.replace_all(&path, "${1}<ip>${2}");
                self.id.replace_all(&path, "${1}<id>${2}").into_owned()
            }
            None => url.to_string(),
        }
    }
}
