//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

pub mod error;
pub mod mac_addr;
pub mod poll;
pub mod set;
