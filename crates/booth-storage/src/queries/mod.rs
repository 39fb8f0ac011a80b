// SPDX-FileCopyrightText: 2026 Booth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules, one per table.

pub mod deliveries;
pub mod kiosks;
pub mod sessions;
pub mod stats;
