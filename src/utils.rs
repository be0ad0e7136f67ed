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

//! Various utilities.

use super::{Error, ErrorKind, Result};

/// Something that can be converted to an ID.
pub trait IntoId {
    /// Convert a value into an ID.
    fn into_id(self) -> String;
}

impl IntoId for String {
    fn into_id(self) -> String {
        self
    }
}

impl IntoId for &String {
    fn into_id(self) -> String {
        self.clone()
    }
}

impl IntoId for &str {
    fn into_id(self) -> String {
        String::from(self)
    }
}

/// Extract the only item from a list result.
///
/// `not_found` and `too_many` become the messages of the corresponding errors.
pub(crate) fn one<T, I, S1, S2>(items: I, not_found: S1, too_many: S2) -> Result<T>
where
    I: IntoIterator<Item = T>,
    S1: Into<String>,
    S2: Into<String>,
{
    let mut iter = items.into_iter();
    match iter.next() {
        Some(result) => {
            if iter.next().is_some() {
                Err(Error::new(ErrorKind::TooManyItems, too_many))
            } else {
                Ok(result)
            }
        }
        None => Err(Error::new(ErrorKind::ResourceNotFound, not_found)),
    }
}

pub mod url {
    //! Handy primitives for working with URLs.

    use reqwest::Url;

    use super::super::{Error, ErrorKind, Result};

    /// Parse an endpoint URL, rejecting URLs that cannot have a path.
    pub fn parse_endpoint(value: &str) -> Result<Url> {
        let url = Url::parse(value).map_err(|e| {
            Error::new(
                ErrorKind::InvalidConfig,
                format!("Invalid endpoint {}: {}", value, e),
            )
        })?;
        if url.cannot_be_a_base() {
            return Err(Error::new(
                ErrorKind::InvalidConfig,
                format!("Endpoint {} cannot be used as a base URL", value),
            ));
        }
        Ok(url)
    }

    /// Append path segments to a base URL.
    ///
    /// Segments are percent-encoded, a trailing slash on the base is ignored.
    pub fn extend<I>(mut url: Url, segments: I) -> Result<Url>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                Error::new(ErrorKind::InvalidInput, "URL cannot be used as a base")
            })?;
            let _ = path.pop_if_empty();
            for segment in segments {
                let _ = path.push(segment.as_ref());
            }
        }
        Ok(url)
    }

    /// Whether the URL has no path segments.
    pub fn is_root(url: &Url) -> bool {
        url.path_segments()
            .map(|mut segments| segments.all(|x| x.is_empty()))
            .unwrap_or(true)
    }
}
