//! Pipeline stages for document translation.
//!
//! Each submodule implements exactly one step; the top-level entry points in
//! [`crate::translate`] run them in order.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ read ──▶ translate ──▶ write
//! (URL/path)  (docx/pdf)  (batches)  (docx + pdf)
//! ```
//!
//! 1. [`input`]     — canonicalise the user-supplied path or URL to a local
//!    file and settle its declared type
//! 2. [`read`]      — extract the ordered paragraphs; runs in `spawn_blocking`
//! 3. [`translate`] — send paragraphs to the translator in fixed-size batches,
//!    reporting progress; the only stage with model I/O
//! 4. [`write`]     — serialise the translations, atomically

pub mod input;
pub mod read;
pub mod translate;
pub mod write;
