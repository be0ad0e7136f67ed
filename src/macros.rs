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

//! Helper macros for resource handles.

/// Expose a field of the inner protocol structure.
macro_rules! transparent_property {
    ($(#[$attr:meta])* $name:ident: ref $type:ty) => (
        $(#[$attr])*
        #[inline]
        pub fn $name(&self) -> &$type {
            &self.inner.$name
        }
    );

    ($(#[$attr:meta])* $name:ident: $type:ty) => (
        $(#[$attr])*
        #[inline]
        pub fn $name(&self) -> $type {
            self.inner.$name
        }
    );
}

/// Setter and builder for an optional field of a creation request.
macro_rules! creation_inner_field {
    ($(#[$attr:meta])* $set_func:ident, $with_func:ident -> $name:ident: optional $type:ty) => (
        $(#[$attr])*
        pub fn $set_func<S: Into<$type>>(&mut self, value: S) {
            self.inner.$name = Some(value.into());
        }

        $(#[$attr])*
        #[inline]
        pub fn $with_func<S: Into<$type>>(mut self, value: S) -> Self {
            self.$set_func(value);
            self
        }
    );

    ($(#[$attr:meta])* $set_func:ident, $with_func:ident -> $name:ident: $type:ty) => (
        $(#[$attr])*
        pub fn $set_func<S: Into<$type>>(&mut self, value: S) {
            self.inner.$name = value.into();
        }

        $(#[$attr])*
        #[inline]
        pub fn $with_func<S: Into<$type>>(mut self, value: S) -> Self {
            self.$set_func(value);
            self
        }
    );
}

/// Implement `Refresh` and `Resource` for a handle with `session` and
/// `inner` fields.
macro_rules! status_resource {
    ($handle:ident, $type_name:expr, $getter:path) => (
        impl $crate::common::Refresh for $handle {
            fn refresh(&mut self) -> $crate::Result<()> {
                self.inner = $getter(&self.session, &self.inner.id)?;
                Ok(())
            }
        }

        impl $crate::common::Resource for $handle {
            fn resource_type(&self) -> &'static str {
                $type_name
            }

            fn resource_id(&self) -> &str {
                &self.inner.id
            }

            fn current_status(&self) -> Option<&str> {
                Some(&self.inner.status)
            }
        }
    );
}
