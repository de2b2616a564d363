// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! DENTMARK - dental image marker annotation
//!
//! Typed markers (points, crosses, lines, ovals, glyphs and freehand strokes)
//! placed on dental photos, kept visually consistent across surface resizes,
//! persisted in native pixel space and projected into counts for the cost
//! calculation.

pub mod config;
pub mod controller;
pub mod io;
pub mod models;
pub mod util;
