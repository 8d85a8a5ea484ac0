// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

#[allow(unused_extern_crates)]
extern crate self as smithery_dynamic;

pub mod client;
pub mod context;
pub mod coordinate;
pub mod crd;
pub mod discovery;
pub mod error;
#[cfg(test)]
mod mock;
pub mod resolver;
pub mod utils;
