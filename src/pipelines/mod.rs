// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines for the booth
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────────┐
//! │ Camera Frame │ ──▶ │  Photo Pipeline   │ ──▶ │  Strip Pipeline  │ ──▶ PNG
//! │   (RGBA)     │     │  - resize 800x600 │     │  - layout        │
//! │              │     │  - mirror         │     │  - title/caption │
//! │              │     │  - vintage filter │     │  - texture       │
//! └──────────────┘     └───────────────────┘     └──────────────────┘
//! ```
//!
//! - [`photo`]: still capture, the vintage filter and PNG encoding
//! - [`strip`]: composition of four stills into the printed strip

pub mod photo;
pub mod strip;
