// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for rasters, marker documents and exports.

pub mod document;
pub mod export;
pub mod media;
pub mod serialization;
