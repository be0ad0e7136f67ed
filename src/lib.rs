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

//! Integration testing toolkit for OpenStack clouds.
//!
//! Most OpenStack operations are asynchronous: the API accepts a request and
//! the resource moves through a series of statuses afterwards. This crate
//! turns such operations into blocking calls with bounded timeouts, so that
//! integration tests can assert on their outcome.
//!
//! # Features
//!
//! * The [status wait primitive](waiter/index.html) and its policies
//! * A blocking [HTTP session](session/index.html) configured from
//!   a [YAML file](config/index.html)
//! * Resource handles for [block storage](block_storage/index.html),
//!   [compute](compute/index.html), [image](image/index.html) and
//!   [network](network/index.html) APIs
//! * API [microversion](common/index.html) negotiation helpers
//! * [Reconstruction of HTTP calls](describe_calls/index.html) made by tests
//!   from a subunit v2 stream
//!
//! # Example
//!
//! ```rust,no_run
//! use tempest::block_storage::NewVolume;
//! use tempest::waiter::Waiter;
//!
//! let session = tempest::Session::from_env().expect("Cannot create a session");
//! let mut volume = NewVolume::new(&session, 1)
//!     .with_name("test-volume")
//!     .create()
//!     .expect("Cannot create a volume");
//! volume
//!     .wait_for_status("available")
//!     .wait()
//!     .expect("Volume did not become available");
//! ```

#![crate_name = "tempest"]
#![crate_type = "lib"]
// NOTE: we do not use generic deny(warnings) to avoid breakages with new
// versions of the compiler. Add more warnings here as you discover them.
// Taken from https://github.com/rust-unofficial/patterns/
#![deny(
    improper_ctypes,
    missing_debug_implementations,
    missing_docs,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    trivial_casts,
    trivial_numeric_casts,
    unconditional_recursion,
    unsafe_code,
    unused_allocation,
    unused_comparisons,
    unused_extern_crates,
    unused_import_braces,
    unused_parens,
    unused_results,
    while_true
)]

#[macro_use]
extern crate log;

#[macro_use]
mod macros;

#[cfg(feature = "block-storage")]
pub mod block_storage;
pub mod common;
#[cfg(feature = "compute")]
pub mod compute;
pub mod config;
pub mod describe_calls;
mod error;
#[cfg(feature = "image")]
pub mod image;
#[cfg(feature = "network")]
pub mod network;
pub mod service;
pub mod session;
mod utils;
pub mod waiter;

pub use crate::common::{ApiVersion, Refresh, Resource, VersionRequest};
pub use crate::config::Config;
pub use crate::error::{Error, ErrorKind, Result, WaitContext};
pub use crate::session::Session;
pub use crate::utils::IntoId;
pub use crate::waiter::{StatusRequest, WaitPolicy, Waiter};
