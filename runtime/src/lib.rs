// Copyright 2026 Style Harvest Contributors
// SPDX-License-Identifier: Apache-2.0

//! Style Harvest runtime — drives a headless browser through a style guide.
//!
//! This library crate exposes the pipeline modules to the binary and to
//! integration tests.

pub mod capture;
pub mod config;
pub mod error;
pub mod extraction;
pub mod pipeline;
pub mod renderer;
pub mod throttle;
