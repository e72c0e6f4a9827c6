//! Pipeline stages for pixelate-and-compress.
//!
//! Each submodule implements exactly one transformation step and can be
//! called on its own; [`crate::compress`] chains them and records timings.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ normalize ──▶ pixelate ──▶ encode
//! (bytes)   (flat RGB/L)  (NN shrink   (JPEG at
//!                          + restore)   quality)
//! ```
//!
//! 1. [`input`]     — extension allow-list gate and bounded decode into a
//!    [`normalize::SourceImage`]
//! 2. [`normalize`] — strip alpha and palette indirection so the encoder
//!    always receives 8-bit RGB or grayscale
//! 3. [`pixelate`]  — nearest-neighbour downscale then upscale back to the
//!    original size, producing uniform blocks
//! 4. [`encode`]    — lossy JPEG encode into an in-memory
//!    [`crate::output::EncodedArtifact`]
//!
//! Every stage is pure and synchronous: no I/O, no shared state.

pub mod encode;
pub mod input;
pub mod normalize;
pub mod pixelate;
