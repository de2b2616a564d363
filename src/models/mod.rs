// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data models for markers, images and the annotation session.

pub mod calculation;
pub mod factory;
pub mod history;
pub mod image;
pub mod marker;
pub mod palette;
pub mod scale;
pub mod session;
