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

//! Reader for the subunit v2 binary stream format.
//!
//! A packet is laid out as follows (all integers are big endian):
//!
//! ```text
//! signature (0xB3) | flags (u16) | length (varint) | [timestamp] | [test id]
//!     | [tags] | [mime type] | [file name, file content] | [route code] | crc32
//! ```
//!
//! The length covers the whole packet including the signature and the CRC.

use std::io::{self, Read, Write};

use chrono::{DateTime, Utc};
use crc::{Crc, CRC_32_ISO_HDLC};

use super::super::{Error, ErrorKind, Result};

/// Packet signature byte.
pub const SIGNATURE: u8 = 0xB3;

/// Largest packet accepted.
pub const MAX_PACKET_LENGTH: usize = 4 * 1024 * 1024;

const VERSION_MASK: u16 = 0xF000;
const VERSION_2: u16 = 0x2000;

const FLAG_TEST_ID: u16 = 0x0800;
const FLAG_ROUTE_CODE: u16 = 0x0400;
const FLAG_TIMESTAMP: u16 = 0x0200;
const FLAG_RUNNABLE: u16 = 0x0100;
const FLAG_TAGS: u16 = 0x0080;
const FLAG_FILE_CONTENT: u16 = 0x0040;
const FLAG_MIME_TYPE: u16 = 0x0020;
const FLAG_EOF: u16 = 0x0010;
const STATUS_MASK: u16 = 0x0007;

/// Status carried by a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    /// No status (attachments, tags).
    Undefined,
    /// The test exists (enumeration).
    Exists,
    /// The test has started.
    InProgress,
    /// The test passed.
    Success,
    /// The test passed, but was expected to fail.
    UnexpectedSuccess,
    /// The test was skipped.
    Skip,
    /// The test failed.
    Fail,
    /// The test failed as expected.
    ExpectedFailure,
}

impl TestStatus {
    fn from_bits(bits: u16) -> TestStatus {
        match bits & STATUS_MASK {
            1 => TestStatus::Exists,
            2 => TestStatus::InProgress,
            3 => TestStatus::Success,
            4 => TestStatus::UnexpectedSuccess,
            5 => TestStatus::Skip,
            6 => TestStatus::Fail,
            7 => TestStatus::ExpectedFailure,
            _ => TestStatus::Undefined,
        }
    }

    fn bits(self) -> u16 {
        match self {
            TestStatus::Undefined => 0,
            TestStatus::Exists => 1,
            TestStatus::InProgress => 2,
            TestStatus::Success => 3,
            TestStatus::UnexpectedSuccess => 4,
            TestStatus::Skip => 5,
            TestStatus::Fail => 6,
            TestStatus::ExpectedFailure => 7,
        }
    }

    /// Whether the status finishes a test.
    pub fn is_final(self) -> bool {
        matches!(
            self,
            TestStatus::Success
                | TestStatus::UnexpectedSuccess
                | TestStatus::Skip
                | TestStatus::Fail
                | TestStatus::ExpectedFailure
        )
    }
}

/// A chunk of an attached file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChunk {
    /// Attachment name, e.g. `pythonlogging` or `traceback`.
    pub name: String,
    /// Bytes of this chunk.
    pub content: Vec<u8>,
    /// Whether this is the last chunk of the attachment.
    pub eof: bool,
}

/// A single decoded packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Test status.
    pub status: TestStatus,
    /// Test ID (absent for non-test data).
    pub test_id: Option<String>,
    /// Event time.
    pub timestamp: Option<DateTime<Utc>>,
    /// Tags attached to the test.
    pub tags: Vec<String>,
    /// Whether the test can be run.
    pub runnable: bool,
    /// MIME type of the attached file.
    pub mime_type: Option<String>,
    /// Attached file chunk.
    pub file: Option<FileChunk>,
    /// Route code of the worker that produced the packet.
    pub route_code: Option<String>,
}

/// Streaming packet reader.
#[derive(Debug)]
pub struct PacketReader<R> {
    reader: R,
    offset: u64,
    non_subunit_name: Option<String>,
    pending: Option<u8>,
}

const PACKET_CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// CRC32 (IEEE) of a byte slice, as used in packet trailers.
pub fn crc32(data: &[u8]) -> u32 {
    PACKET_CRC.checksum(data)
}

fn malformed<S: Into<String>>(message: S) -> Error {
    Error::new(ErrorKind::InvalidResponse, message)
}

/// Number of bytes a variable-length number takes, judging by its first byte.
fn varint_length(first: u8) -> usize {
    usize::from(first >> 6) + 1
}

struct Decoder<'d> {
    data: &'d [u8],
    pos: usize,
}

impl<'d> Decoder<'d> {
    fn take(&mut self, count: usize) -> Result<&'d [u8]> {
        let end = self
            .pos
            .checked_add(count)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| malformed("Packet is shorter than its fields"))?;
        let result = &self.data[self.pos..end];
        self.pos = end;
        Ok(result)
    }

    fn u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn varint(&mut self) -> Result<u32> {
        let first = self.take(1)?[0];
        let rest = self.take(varint_length(first) - 1)?;
        Ok(rest
            .iter()
            .fold(u32::from(first & 0x3F), |acc, b| (acc << 8) | u32::from(*b)))
    }

    fn bytes(&mut self) -> Result<&'d [u8]> {
        let length = self.varint()? as usize;
        self.take(length)
    }

    fn string(&mut self) -> Result<String> {
        let bytes = self.bytes()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| malformed(format!("Invalid UTF-8 string: {}", e)))
    }
}

impl<R: Read> PacketReader<R> {
    /// Create a reader over a byte stream.
    pub fn new(reader: R) -> PacketReader<R> {
        PacketReader {
            reader,
            offset: 0,
            non_subunit_name: None,
            pending: None,
        }
    }

    /// Wrap bytes found between packets into file chunks with this name.
    ///
    /// Such chunks have no test ID. Without a name, non-subunit bytes are
    /// an error.
    pub fn with_non_subunit_name<S: Into<String>>(mut self, name: S) -> PacketReader<R> {
        self.non_subunit_name = Some(name.into());
        self
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        if let Some(byte) = self.pending.take() {
            return Ok(Some(byte));
        }

        let mut buffer = [0u8; 1];
        loop {
            match self.reader.read(&mut buffer) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buffer[0])),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn read_non_subunit(&mut self, first: u8, name: String) -> Result<Packet> {
        let mut content = vec![first];
        while let Some(byte) = self.read_byte()? {
            if byte == SIGNATURE {
                self.pending = Some(byte);
                break;
            }
            content.push(byte);
        }

        debug!(
            "Wrapping {} non-subunit byte(s) at offset {} as {}",
            content.len(),
            self.offset,
            name
        );
        self.offset += content.len() as u64;
        Ok(Packet::new(TestStatus::Undefined).with_file(name, content, false))
    }

    /// Read the next packet, `None` on a clean end of stream.
    pub fn read_packet(&mut self) -> Result<Option<Packet>> {
        let first = match self.read_byte()? {
            Some(byte) => byte,
            None => return Ok(None),
        };
        if first != SIGNATURE {
            return match self.non_subunit_name.clone() {
                Some(name) => self.read_non_subunit(first, name).map(Some),
                None => Err(malformed(format!(
                    "Invalid packet signature 0x{:02X} at offset {} (only subunit v2 is supported)",
                    first, self.offset
                ))),
            };
        }

        // Signature, flags and the first byte of the length.
        let mut header = vec![SIGNATURE, 0, 0, 0];
        self.reader.read_exact(&mut header[1..])?;
        let extra = varint_length(header[3]) - 1;
        let mut length_rest = vec![0u8; extra];
        self.reader.read_exact(&mut length_rest)?;
        header.extend_from_slice(&length_rest);

        let length = header[4..]
            .iter()
            .fold(u32::from(header[3] & 0x3F), |acc, b| (acc << 8) | u32::from(*b))
            as usize;
        if length > MAX_PACKET_LENGTH || length < header.len() + 4 {
            return Err(malformed(format!(
                "Invalid packet length {} at offset {}",
                length, self.offset
            )));
        }

        let mut packet = header;
        packet.resize(length, 0);
        let start = 4 + extra;
        self.reader.read_exact(&mut packet[start..])?;

        let (body, crc) = packet.split_at(length - 4);
        let expected = u32::from_be_bytes([crc[0], crc[1], crc[2], crc[3]]);
        let actual = crc32(body);
        if expected != actual {
            return Err(malformed(format!(
                "CRC mismatch at offset {}: expected 0x{:08X}, got 0x{:08X}",
                self.offset, expected, actual
            )));
        }

        let result = decode(body, start)?;
        trace!("Read packet at offset {}: {:?}", self.offset, result.test_id);
        self.offset += length as u64;
        Ok(Some(result))
    }
}

impl<R: Read> Iterator for PacketReader<R> {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Result<Packet>> {
        self.read_packet().transpose()
    }
}

fn decode(body: &[u8], start: usize) -> Result<Packet> {
    let flags = u16::from_be_bytes([body[1], body[2]]);
    if flags & VERSION_MASK != VERSION_2 {
        return Err(malformed(format!(
            "Unsupported subunit version {}",
            (flags & VERSION_MASK) >> 12
        )));
    }

    let mut decoder = Decoder {
        data: body,
        pos: start,
    };

    let timestamp = if flags & FLAG_TIMESTAMP != 0 {
        let seconds = decoder.u32()?;
        let nanos = decoder.varint()?;
        Some(
            DateTime::from_timestamp(i64::from(seconds), nanos)
                .ok_or_else(|| malformed("Invalid timestamp"))?,
        )
    } else {
        None
    };

    let test_id = if flags & FLAG_TEST_ID != 0 {
        Some(decoder.string()?)
    } else {
        None
    };

    let tags = if flags & FLAG_TAGS != 0 {
        let count = decoder.varint()?;
        (0..count)
            .map(|_| decoder.string())
            .collect::<Result<Vec<_>>>()?
    } else {
        Vec::new()
    };

    let mime_type = if flags & FLAG_MIME_TYPE != 0 {
        Some(decoder.string()?)
    } else {
        None
    };

    let file = if flags & FLAG_FILE_CONTENT != 0 {
        let name = decoder.string()?;
        let content = decoder.bytes()?.to_vec();
        Some(FileChunk {
            name,
            content,
            eof: flags & FLAG_EOF != 0,
        })
    } else {
        None
    };

    let route_code = if flags & FLAG_ROUTE_CODE != 0 {
        Some(decoder.string()?)
    } else {
        None
    };

    if decoder.pos != body.len() {
        return Err(malformed("Trailing bytes in packet"));
    }

    Ok(Packet {
        status: TestStatus::from_bits(flags),
        test_id,
        timestamp,
        tags,
        runnable: flags & FLAG_RUNNABLE != 0,
        mime_type,
        file,
        route_code,
    })
}


impl Packet {
    /// A packet with only a status.
    pub fn new(status: TestStatus) -> Packet {
        Packet {
            status,
            test_id: None,
            timestamp: None,
            tags: Vec::new(),
            runnable: false,
            mime_type: None,
            file: None,
            route_code: None,
        }
    }

    /// Set the test ID.
    pub fn with_test_id<S: Into<String>>(mut self, test_id: S) -> Packet {
        self.test_id = Some(test_id.into());
        self
    }

    /// Set the timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Packet {
        self.timestamp = Some(timestamp);
        self
    }

    /// Add a tag.
    pub fn with_tag<S: Into<String>>(mut self, tag: S) -> Packet {
        self.tags.push(tag.into());
        self
    }

    /// Attach a file chunk.
    pub fn with_file<S: Into<String>>(mut self, name: S, content: Vec<u8>, eof: bool) -> Packet {
        self.file = Some(FileChunk {
            name: name.into(),
            content,
            eof,
        });
        self
    }

    /// Set the MIME type of the attached file.
    pub fn with_mime_type<S: Into<String>>(mut self, mime_type: S) -> Packet {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Set the route code.
    pub fn with_route_code<S: Into<String>>(mut self, route_code: S) -> Packet {
        self.route_code = Some(route_code.into());
        self
    }

    fn flags(&self) -> u16 {
        let mut flags = VERSION_2 | self.status.bits();
        let optional = [
            (self.test_id.is_some(), FLAG_TEST_ID),
            (self.route_code.is_some(), FLAG_ROUTE_CODE),
            (self.timestamp.is_some(), FLAG_TIMESTAMP),
            (self.runnable, FLAG_RUNNABLE),
            (!self.tags.is_empty(), FLAG_TAGS),
            (self.file.is_some(), FLAG_FILE_CONTENT),
            (self.mime_type.is_some(), FLAG_MIME_TYPE),
            (self.file.as_ref().is_some_and(|f| f.eof), FLAG_EOF),
        ];
        for (present, flag) in optional {
            if present {
                flags |= flag;
            }
        }
        flags
    }

    /// Serialize the packet.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut fields = Vec::new();
        if let Some(ts) = self.timestamp {
            let seconds = u32::try_from(ts.timestamp())
                .map_err(|_| Error::new(ErrorKind::InvalidInput, "Timestamp out of range"))?;
            fields.extend_from_slice(&seconds.to_be_bytes());
            encode_varint(&mut fields, ts.timestamp_subsec_nanos())?;
        }
        if let Some(ref test_id) = self.test_id {
            encode_bytes(&mut fields, test_id.as_bytes())?;
        }
        if !self.tags.is_empty() {
            encode_varint(&mut fields, self.tags.len() as u32)?;
            for tag in &self.tags {
                encode_bytes(&mut fields, tag.as_bytes())?;
            }
        }
        if let Some(ref mime_type) = self.mime_type {
            encode_bytes(&mut fields, mime_type.as_bytes())?;
        }
        if let Some(ref file) = self.file {
            encode_bytes(&mut fields, file.name.as_bytes())?;
            encode_bytes(&mut fields, &file.content)?;
        }
        if let Some(ref route_code) = self.route_code {
            encode_bytes(&mut fields, route_code.as_bytes())?;
        }

        // The length includes itself, so pick the smallest size that fits.
        let base = 1 + 2 + fields.len() + 4;
        let length = (1..=4)
            .map(|size| base + size)
            .find(|total| varint_size(*total as u32).is_some_and(|size| base + size == *total))
            .filter(|total| *total <= MAX_PACKET_LENGTH)
            .ok_or_else(|| Error::new(ErrorKind::InvalidInput, "Packet is too large"))?;

        let mut packet = Vec::with_capacity(length);
        packet.push(SIGNATURE);
        packet.extend_from_slice(&self.flags().to_be_bytes());
        encode_varint(&mut packet, length as u32)?;
        packet.extend_from_slice(&fields);
        let crc = crc32(&packet);
        packet.extend_from_slice(&crc.to_be_bytes());
        Ok(packet)
    }
}

fn varint_size(value: u32) -> Option<usize> {
    match value {
        0..=0x3F => Some(1),
        0x40..=0x3FFF => Some(2),
        0x4000..=0x3F_FFFF => Some(3),
        0x40_0000..=0x3FFF_FFFF => Some(4),
        _ => None,
    }
}

fn encode_varint(buffer: &mut Vec<u8>, value: u32) -> Result<()> {
    let size = varint_size(value)
        .ok_or_else(|| Error::new(ErrorKind::InvalidInput, "Number is too large for subunit"))?;
    let bytes = value.to_be_bytes();
    let mut encoded = bytes[4 - size..].to_vec();
    encoded[0] |= ((size - 1) as u8) << 6;
    buffer.extend_from_slice(&encoded);
    Ok(())
}

fn encode_bytes(buffer: &mut Vec<u8>, value: &[u8]) -> Result<()> {
    encode_varint(buffer, value.len() as u32)?;
    buffer.extend_from_slice(value);
    Ok(())
}

/// Write packets into a stream.
pub fn write_packets<'p, W, I>(writer: &mut W, packets: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'p Packet>,
{
    for packet in packets {
        writer.write_all(&packet.encode()?)?;
    }
    Ok(())
}
