//! Pipeline stages for page color scanning.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the rendering backend can be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ classify
//! (path)    (pdfium)   (R = G = B ?)
//! ```
//!
//! 1. [`input`]    : validate the user-supplied path before pdfium sees it
//! 2. [`render`]   : count pages, then rasterise them one at a time; blocking
//! 3. [`classify`] : exact per-pixel channel comparison on each page image

pub mod classify;
pub mod input;
pub mod render;
