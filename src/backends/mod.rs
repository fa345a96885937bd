// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for frame sources
//!
//! The booth only needs one thing from hardware: the most recent frame of a
//! live camera. Backends hide how that frame is obtained:
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │        Session / Terminal UI         │
//! └──────────────────┬───────────────────┘
//!                    │ FrameSource
//!       ┌────────────┴────────────┐
//!  ┌────┴─────┐            ┌──────┴─────┐
//!  │   V4L2   │            │ Image files│
//!  └──────────┘            └────────────┘
//! ```
//!
//! - [`camera`]: frame source trait, V4L2 capture and file-backed sources

pub mod camera;
