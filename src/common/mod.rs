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

//! Types and traits shared by all API parts.

mod apiversion;

pub use self::apiversion::{
    assert_version_header_matches_request, check_skip_with_microversion,
    select_request_microversion, ApiVersion, MicroversionCheck, VersionRequest,
};

use super::Result;

/// Trait representing something that can be refreshed.
pub trait Refresh {
    /// Refresh the resource representation.
    fn refresh(&mut self) -> Result<()>;
}

/// A remote resource that can be waited on.
pub trait Resource: Refresh {
    /// Human-readable resource type used in logs and errors.
    fn resource_type(&self) -> &'static str;

    /// Identifier of the resource.
    fn resource_id(&self) -> &str;

    /// Status as of the last refresh, if the resource has one.
    fn current_status(&self) -> Option<&str>;
}
