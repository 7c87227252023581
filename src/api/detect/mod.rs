// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection API endpoint module
//!
//! Provides POST /detect for locating licence plates in an image.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{detect_handler, run_detection};
pub use request::DetectRequest;
pub use response::DetectResponse;
