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

//! API microversions.

use std::fmt;
use std::str::FromStr;

use reqwest::header::HeaderMap;
use serde::de::{Error as DeserError, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::super::{Error, ErrorKind, Result};

/// API version (major, minor).
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct ApiVersion(pub u16, pub u16);

/// Requested microversion: either a concrete one or the latest available.
///
/// `latest` compares greater than any concrete version. The default is the
/// null version `0.0`, meaning "no microversion".
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub enum VersionRequest {
    /// A concrete version.
    Version(ApiVersion),
    /// The latest version the server supports.
    Latest,
}

/// Outcome of comparing a test microversion range with the configured one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MicroversionCheck {
    /// The ranges intersect, the test can run.
    Run,
    /// The ranges do not intersect; contains the reason.
    Skip(String),
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0, self.1)
    }
}

fn parse_component(component: &str, message: &str) -> Result<u16> {
    component
        .parse()
        .map_err(|_| Error::new(ErrorKind::InvalidInput, message))
}

impl FromStr for ApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<ApiVersion> {
        let parts: Vec<&str> = s.split('.').collect();

        if parts.len() != 2 {
            let msg = format!("Invalid API version: expected X.Y, got {}", s);
            return Err(Error::new(ErrorKind::InvalidInput, msg));
        }

        let major = parse_component(parts[0], "First version component is not a number")?;

        let minor = parse_component(parts[1], "Second version component is not a number")?;

        Ok(ApiVersion(major, minor))
    }
}

impl Serialize for ApiVersion {
    fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

struct ApiVersionVisitor;

impl Visitor<'_> for ApiVersionVisitor {
    type Value = ApiVersion;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a string in format X.Y")
    }

    fn visit_str<E>(self, value: &str) -> ::std::result::Result<ApiVersion, E>
    where
        E: DeserError,
    {
        ApiVersion::from_str(value).map_err(DeserError::custom)
    }
}

impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D>(deserializer: D) -> ::std::result::Result<ApiVersion, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(ApiVersionVisitor)
    }
}

impl Default for VersionRequest {
    fn default() -> VersionRequest {
        VersionRequest::Version(ApiVersion(0, 0))
    }
}

impl From<ApiVersion> for VersionRequest {
    fn from(value: ApiVersion) -> VersionRequest {
        VersionRequest::Version(value)
    }
}

impl fmt::Display for VersionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionRequest::Version(v) => v.fmt(f),
            VersionRequest::Latest => f.write_str("latest"),
        }
    }
}

impl FromStr for VersionRequest {
    type Err = Error;

    fn from_str(s: &str) -> Result<VersionRequest> {
        if s == "latest" {
            Ok(VersionRequest::Latest)
        } else {
            s.parse().map(VersionRequest::Version)
        }
    }
}

impl Serialize for VersionRequest {
    fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionRequest {
    fn deserialize<D>(deserializer: D) -> ::std::result::Result<VersionRequest, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        VersionRequest::from_str(&text).map_err(DeserError::custom)
    }
}

/// Check whether a test supporting `[test_min, test_max]` can run against
/// a cloud configured for `[cfg_min, cfg_max]`.
///
/// Fails with `InvalidInput` if either range is inverted.
pub fn check_skip_with_microversion(
    test_min: VersionRequest,
    test_max: VersionRequest,
    cfg_min: VersionRequest,
    cfg_max: VersionRequest,
) -> Result<MicroversionCheck> {
    if test_min > test_max || cfg_min > cfg_max {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!(
                "Test versions [{} - {}]. Configuration versions [{} - {}].",
                test_min, test_max, cfg_min, cfg_max
            ),
        ));
    }

    if test_max < cfg_min || cfg_max < test_min {
        let reason = format!(
            "The microversion range [{} - {}] of this test is out of the configuration range [{} - {}].",
            test_min, test_max, cfg_min, cfg_max
        );
        debug!("{}", reason);
        Ok(MicroversionCheck::Skip(reason))
    } else {
        Ok(MicroversionCheck::Run)
    }
}

/// Select the microversion to request: the greater of the two minimums.
pub fn select_request_microversion(
    test_min: VersionRequest,
    cfg_min: VersionRequest,
) -> VersionRequest {
    std::cmp::max(test_min, cfg_min)
}

/// Check that the response carries the expected microversion header.
pub fn assert_version_header_matches_request(
    header_name: &str,
    expected: &str,
    headers: &HeaderMap,
) -> Result<()> {
    match headers.get(header_name).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        value => Err(Error::new(
            ErrorKind::InvalidResponse,
            format!(
                "Microversion header '{}' with value '{}' does not match in response - {:?}",
                header_name, expected, value
            ),
        )),
    }
}

#[cfg(test)]
pub mod test {
    #![allow(missing_docs)]

    use std::str::FromStr;

    use reqwest::header::{HeaderMap, HeaderValue};

    use super::super::super::ErrorKind;
    use super::*;

    fn v(s: &str) -> VersionRequest {
        VersionRequest::from_str(s).unwrap()
    }

    #[test]
    fn test_apiversion_format() {
        let ver = ApiVersion(2, 27);
        assert_eq!(&ver.to_string(), "2.27");
        assert_eq!(ApiVersion::from_str("2.27").unwrap(), ver);
        assert!(ApiVersion::from_str("2").is_err());
        assert!(ApiVersion::from_str("2.x").is_err());
    }

    #[test]
    fn test_apiversion_serde() {
        let ver = ApiVersion(2, 27);
        let ser = serde_json::to_string(&ver).unwrap();
        assert_eq!(&ser, "\"2.27\"");
        assert_eq!(serde_json::from_str::<ApiVersion>(&ser).unwrap(), ver);
    }

    #[test]
    fn test_version_request_ordering() {
        assert!(v("latest") > v("2.90"));
        assert!(v("2.10") > v("2.9"));
        assert_eq!(VersionRequest::default(), v("0.0"));
        assert_eq!(v("latest").to_string(), "latest");
        assert_eq!(serde_json::from_str::<VersionRequest>("\"2.5\"").unwrap(), v("2.5"));
    }

    #[test]
    fn test_check_skip() {
        assert_eq!(
            check_skip_with_microversion(v("2.2"), v("latest"), v("2.1"), v("2.30")).unwrap(),
            MicroversionCheck::Run
        );
        assert!(matches!(
            check_skip_with_microversion(v("2.40"), v("latest"), v("2.1"), v("2.30")).unwrap(),
            MicroversionCheck::Skip(_)
        ));
        assert!(matches!(
            check_skip_with_microversion(v("2.1"), v("2.5"), v("2.10"), v("latest")).unwrap(),
            MicroversionCheck::Skip(_)
        ));
        assert_eq!(
            check_skip_with_microversion(v("2.10"), v("2.5"), v("2.1"), v("latest"))
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            check_skip_with_microversion(
                VersionRequest::default(),
                v("latest"),
                VersionRequest::default(),
                VersionRequest::default()
            )
            .unwrap(),
            MicroversionCheck::Run
        );
    }

    #[test]
    fn test_select_request_microversion() {
        assert_eq!(select_request_microversion(v("2.2"), v("2.10")), v("2.10"));
        assert_eq!(select_request_microversion(v("2.20"), v("2.10")), v("2.20"));
        assert_eq!(
            select_request_microversion(v("latest"), v("2.10")),
            v("latest")
        );
    }

    #[test]
    fn test_version_header() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(
            "x-openstack-nova-api-version",
            HeaderValue::from_static("2.10"),
        );
        assert!(
            assert_version_header_matches_request("X-OpenStack-Nova-API-Version", "2.10", &headers)
                .is_ok()
        );
        assert_eq!(
            assert_version_header_matches_request("X-OpenStack-Nova-API-Version", "2.2", &headers)
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidResponse
        );
        assert!(assert_version_header_matches_request(
            "OpenStack-API-Version",
            "volume 3.0",
            &headers
        )
        .is_err());
    }
}
