// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

#[allow(unused_extern_crates)]
extern crate self as smithery_server;

pub mod error;
pub mod forge;
pub mod router;
pub mod server;
pub mod widgets;
