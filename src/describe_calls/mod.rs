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

//! Reconstruction of HTTP calls made by tests.
//!
//! Reads a subunit v2 stream of a test run and extracts, for every test that
//! succeeded, failed or was skipped, the HTTP calls logged by the REST client
//! in the test's attachments.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::fs::File;
//!
//! use tempest::describe_calls::{describe_calls, DescribeOptions};
//!
//! let stream = File::open("testrepository.subunit").expect("Cannot open stream");
//! let calls = describe_calls(stream, &DescribeOptions::default())
//!     .expect("Cannot parse stream");
//! println!("{}", serde_json::to_string_pretty(&calls).expect("Cannot serialize"));
//! ```

mod parser;
mod subunit;

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub use self::parser::{default_ports, load_ports, Call, CallParser, DEFAULT_PORTS, UNKNOWN_SERVICE};
pub use self::subunit::{crc32, write_packets, FileChunk, Packet, PacketReader, TestStatus};

use super::Result;

/// Default name given to non-subunit bytes found in a stream.
pub const DEFAULT_NON_SUBUNIT_NAME: &str = "pythonlogging";

/// Calls made by each test, keyed by the test ID.
pub type TestCalls = BTreeMap<String, Vec<Call>>;

/// Options for call reconstruction.
#[derive(Debug, Clone)]
pub struct DescribeOptions {
    /// Name given to non-subunit bytes found between packets.
    pub non_subunit_name: String,
    /// Port to service mapping, `None` for the default one.
    pub ports: Option<HashMap<String, String>>,
}

impl Default for DescribeOptions {
    fn default() -> DescribeOptions {
        DescribeOptions {
            non_subunit_name: DEFAULT_NON_SUBUNIT_NAME.to_string(),
            ports: None,
        }
    }
}

impl DescribeOptions {
    /// Use a different name for non-subunit bytes.
    pub fn with_non_subunit_name<S: Into<String>>(mut self, name: S) -> DescribeOptions {
        self.non_subunit_name = name.into();
        self
    }

    /// Load the port to service mapping from a JSON file.
    pub fn with_ports_file<P: AsRef<Path>>(mut self, path: P) -> Result<DescribeOptions> {
        self.ports = Some(load_ports(path)?);
        Ok(self)
    }
}

/// Attachments of one test in the order they first appeared.
type Attachments = Vec<(String, Vec<u8>)>;

fn records_calls(status: TestStatus) -> bool {
    matches!(
        status,
        TestStatus::Success | TestStatus::Skip | TestStatus::Fail
    )
}

fn parse_attachments(parser: &CallParser, attachments: &Attachments) -> Vec<Call> {
    attachments
        .iter()
        .flat_map(|(_, content)| parser.parse(&String::from_utf8_lossy(content)))
        .collect()
}

/// Reconstruct HTTP calls from a subunit v2 stream.
///
/// Every attachment of a test is scanned. Expected failures and unexpected
/// successes are not reported. Non-subunit bytes between packets are
/// skipped.
pub fn describe_calls<R: Read>(stream: R, options: &DescribeOptions) -> Result<TestCalls> {
    let parser = match options.ports {
        Some(ref ports) => CallParser::with_services(ports.clone())?,
        None => CallParser::new()?,
    };

    let mut logs: HashMap<String, Attachments> = HashMap::new();
    let mut result = TestCalls::new();

    let reader = PacketReader::new(stream).with_non_subunit_name(options.non_subunit_name.clone());
    for packet in reader {
        let packet = packet?;
        let test_id = match packet.test_id {
            Some(test_id) => test_id,
            None => {
                debug!("Skipping a packet without a test ID");
                continue;
            }
        };

        if let Some(file) = packet.file {
            let attachments = logs.entry(test_id.clone()).or_default();
            match attachments.iter_mut().find(|(name, _)| *name == file.name) {
                Some((_, content)) => content.extend_from_slice(&file.content),
                None => attachments.push((file.name, file.content)),
            }
        }

        if packet.status.is_final() {
            let attachments = logs.remove(&test_id).unwrap_or_default();
            if records_calls(packet.status) {
                let calls = parse_attachments(&parser, &attachments);
                debug!(
                    "Test {} finished with {:?}, {} call(s) found",
                    test_id,
                    packet.status,
                    calls.len()
                );
                let _ = result.insert(test_id, calls);
            } else {
                debug!("Not reporting test {} finished with {:?}", test_id, packet.status);
            }
        }
    }

    for test_id in logs.keys() {
        warn!("Test {} has attachments, but never finished", test_id);
    }

    Ok(result)
}

/// Reconstruct HTTP calls from a subunit v2 file.
pub fn describe_file<P: AsRef<Path>>(path: P, options: &DescribeOptions) -> Result<TestCalls> {
    let file = File::open(path.as_ref())?;
    describe_calls(BufReader::new(file), options)
}

#[cfg(test)]
pub mod test {
    #![allow(missing_docs)]

    use super::{describe_calls, write_packets, DescribeOptions, Packet, TestStatus};

    const LOG: &str = "2016-06-24 17:40:18.383 INFO tempest.lib.common.rest_client \
        [req-1 ] Request (ServersTest:test_boot): 202 POST http://h:8774/v2.1/servers 0.4s\n\
        2016-06-24 17:40:19.001 DEBUG tempest.lib.common.rest_client body\n\
        2016-06-24 17:40:20.111 INFO tempest.lib.common.rest_client \
        [req-2 ] Request (ServersTest:test_boot): 200 GET http://h:8774/v2.1/servers/detail 0.1s\n";

    fn stream(packets: &[Packet]) -> Vec<u8> {
        let mut data = Vec::new();
        write_packets(&mut data, packets).unwrap();
        data
    }

    #[test]
    fn test_calls_in_order() {
        let (first, second) = LOG.split_at(LOG.len() / 2);
        let data = stream(&[
            Packet::new(TestStatus::InProgress).with_test_id("test_boot"),
            Packet::new(TestStatus::Undefined)
                .with_test_id("test_boot")
                .with_file("pythonlogging", first.as_bytes().to_vec(), false),
            Packet::new(TestStatus::Undefined)
                .with_test_id("test_boot")
                .with_file("pythonlogging", second.as_bytes().to_vec(), true),
            Packet::new(TestStatus::Success).with_test_id("test_boot"),
        ]);
        let result = describe_calls(&data[..], &DescribeOptions::default()).unwrap();
        let calls = &result["test_boot"];
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].verb, "POST");
        assert_eq!(calls[0].url, "v2.1/servers");
        assert_eq!(calls[0].service, "Nova");
        assert_eq!(calls[1].verb, "GET");
        assert_eq!(calls[1].url, "v2.1/servers/detail");
    }

    #[test]
    fn test_all_attachments_scanned() {
        let (first, second) = LOG.split_at(LOG.len() / 2);
        let data = stream(&[
            Packet::new(TestStatus::Undefined)
                .with_test_id("test_boot")
                .with_file("pythonlogging", first.as_bytes().to_vec(), false),
            Packet::new(TestStatus::Undefined)
                .with_test_id("test_boot")
                .with_file("traceback", b"Traceback (most recent call last)\n".to_vec(), true),
            Packet::new(TestStatus::Fail)
                .with_test_id("test_boot")
                .with_file("pythonlogging", second.as_bytes().to_vec(), true),
        ]);
        let result = describe_calls(&data[..], &DescribeOptions::default()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result["test_boot"].len(), 2);
    }

    #[test]
    fn test_expected_outcomes_not_reported() {
        let data = stream(&[
            Packet::new(TestStatus::ExpectedFailure)
                .with_test_id("test_xfail")
                .with_file("pythonlogging", LOG.as_bytes().to_vec(), true),
            Packet::new(TestStatus::UnexpectedSuccess)
                .with_test_id("test_uxsuccess")
                .with_file("pythonlogging", LOG.as_bytes().to_vec(), true),
            Packet::new(TestStatus::Skip)
                .with_test_id("test_skip")
                .with_file("log", LOG.as_bytes().to_vec(), true),
        ]);
        let result = describe_calls(&data[..], &DescribeOptions::default()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result["test_skip"].len(), 2);
    }

    #[test]
    fn test_non_subunit_bytes_skipped() {
        let mut data = b"Running tests\n".to_vec();
        data.extend(stream(&[Packet::new(TestStatus::Success)
            .with_test_id("test_boot")
            .with_file("pythonlogging", LOG.as_bytes().to_vec(), true)]));
        data.extend_from_slice(LOG.as_bytes());
        let options = DescribeOptions::default().with_non_subunit_name("stdout");
        let result = describe_calls(&data[..], &options).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result["test_boot"].len(), 2);
    }

    #[test]
    fn test_unfinished_test_not_reported() {
        let data = stream(&[
            Packet::new(TestStatus::InProgress).with_test_id("test_boot"),
            Packet::new(TestStatus::Undefined)
                .with_test_id("test_boot")
                .with_file("pythonlogging", LOG.as_bytes().to_vec(), true),
        ]);
        let result = describe_calls(&data[..], &DescribeOptions::default()).unwrap();
        assert!(result.is_empty());
    }
}
