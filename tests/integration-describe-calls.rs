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

use chrono::{TimeZone, Utc};

use tempest::describe_calls::{
    describe_file, write_packets, DescribeOptions, Packet, PacketReader, TestStatus,
};
use tempest::ErrorKind;

const VOLUMES_LOG: &str = "\
2024-03-01 10:00:00.100 INFO tempest.lib.common.rest_client [req-1 ] \
Request (VolumesTest:test_create): 202 POST \
http://10.0.0.5:8776/v3/1f2c7e3a9b0d4c5e8f6a7b8c9d0e1f2a/volumes 0.482s
2024-03-01 10:00:00.200 DEBUG tempest.lib.common.rest_client Request - Headers: {}
2024-03-01 10:00:01.100 INFO tempest.lib.common.rest_client [req-2 ] \
Request (VolumesTest:test_create): 200 GET \
http://10.0.0.5:8776/v3/1f2c7e3a9b0d4c5e8f6a7b8c9d0e1f2a/volumes/0b3f9c2e-1d4a-4b5c-8e6f-7a8b9c0d1e2f 0.051s
";

const IRONIC_LOG: &str = "\
2024-03-01 10:00:02.100 INFO tempest.lib.common.rest_client [req-3 ] \
Request (NodesTest:test_list): 200 GET http://10.0.0.5:6385/v1/nodes 0.020s
";

fn write_stream(packets: &[Packet]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("Cannot create a file");
    write_packets(&mut file, packets).expect("Cannot write packets");
    file.flush().expect("Cannot flush");
    file
}

fn test_run(test_id: &str, log: &str, status: TestStatus) -> Vec<Packet> {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    vec![
        Packet::new(TestStatus::InProgress)
            .with_test_id(test_id)
            .with_timestamp(start),
        Packet::new(TestStatus::Undefined)
            .with_test_id(test_id)
            .with_mime_type("text/plain;charset=utf8")
            .with_file("pythonlogging", log.as_bytes().to_vec(), true),
        Packet::new(status)
            .with_test_id(test_id)
            .with_tag("worker-0"),
    ]
}

#[test]
fn test_describe_file() {
    let mut packets = test_run("test_create", VOLUMES_LOG, TestStatus::Success);
    packets.extend(test_run("test_list", IRONIC_LOG, TestStatus::Fail));
    let file = write_stream(&packets);

    let result = describe_file(file.path(), &DescribeOptions::default())
        .expect("Cannot describe calls");
    assert_eq!(result.len(), 2);

    let create = &result["test_create"];
    assert_eq!(create.len(), 2);
    assert_eq!(create[0].name, "VolumesTest:test_create");
    assert_eq!(create[0].verb, "POST");
    assert_eq!(create[0].status_code, "202");
    assert_eq!(create[0].service, "Block Storage");
    assert_eq!(create[0].url, "v3/<id>/volumes");
    assert_eq!(create[1].verb, "GET");
    assert_eq!(create[1].url, "v3/<id>/volumes/<uuid>");

    let list = &result["test_list"];
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].service, "Unknown");
}

#[test]
fn test_describe_file_with_ports() {
    let file = write_stream(&test_run("test_list", IRONIC_LOG, TestStatus::Success));
    let mut ports = tempfile::NamedTempFile::new().expect("Cannot create a file");
    ports
        .write_all(br#"{"6385": "Ironic"}"#)
        .expect("Cannot write ports");

    let options = DescribeOptions::default()
        .with_ports_file(ports.path())
        .expect("Cannot load ports");
    let result = describe_file(file.path(), &options).expect("Cannot describe calls");
    assert_eq!(result["test_list"][0].service, "Ironic");
}

#[test]
fn test_describe_json_output() {
    let file = write_stream(&test_run("test_list", IRONIC_LOG, TestStatus::Skip));
    let result = describe_file(file.path(), &DescribeOptions::default())
        .expect("Cannot describe calls");
    let value = serde_json::to_value(&result).expect("Cannot serialize");
    assert_eq!(
        value,
        serde_json::json!({
            "test_list": [{
                "name": "NodesTest:test_list",
                "verb": "GET",
                "service": "Unknown",
                "url": "v1/nodes",
                "status_code": "200"
            }]
        })
    );
}

#[test]
fn test_packets_read_back() {
    let packets = test_run("test_create", VOLUMES_LOG, TestStatus::Success);
    let file = write_stream(&packets);
    let reader = PacketReader::new(std::fs::File::open(file.path()).expect("Cannot open"));
    let read: Vec<Packet> = reader
        .collect::<Result<_, _>>()
        .expect("Cannot read packets");
    assert_eq!(read.len(), 3);
    assert!(read[0].timestamp.is_some());
    assert_eq!(read[1].mime_type.as_deref(), Some("text/plain;charset=utf8"));
    assert_eq!(read[2].tags, vec!["worker-0".to_string()]);
    assert!(read[2].status.is_final());
}

#[test]
fn test_corrupted_file() {
    let file = write_stream(&test_run("test_create", VOLUMES_LOG, TestStatus::Success));
    let mut data = std::fs::read(file.path()).expect("Cannot read");
    let last = data.len() - 1;
    data[last] ^= 0xFF;
    let mut broken = tempfile::NamedTempFile::new().expect("Cannot create a file");
    broken.write_all(&data).expect("Cannot write");

    let err = describe_file(broken.path(), &DescribeOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
}

#[test]
fn test_missing_ports_file() {
    let err = DescribeOptions::default()
        .with_ports_file("/nonexistent/ports.json")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
}
