// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Interaction controllers for the active surface.

pub mod crop;
pub mod fullscreen;
pub mod midline;
pub mod surface;
