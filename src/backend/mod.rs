// Copyright 2026 Daniel Pelikan
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

//! Platform socket backends.
//!
//! Each host Bluetooth stack implements [`crate::socket::PlatformSocket`]
//! once; the server core is written against the trait and does not know
//! which backend it runs on.

#[cfg(target_os = "linux")]
pub mod bluez;

pub mod sim;
