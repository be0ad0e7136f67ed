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

//! Compute API implementation bits.

pub mod api;
mod images;
pub mod protocol;
mod servers;

pub use self::images::{wait_for_image_status, Image, IMAGE_FAILURE_STATUSES};
pub use self::servers::{
    wait_for_server_status, wait_for_server_termination, NewServer, Server,
    SERVER_FAILURE_STATUSES,
};
