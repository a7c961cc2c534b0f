//! Pipeline stages for PDF field extraction.
//!
//! Each submodule implements one transformation step, so each can be tested
//! on its own and the two I/O boundaries (PDF library, model API) can be
//! swapped for in-memory stand-ins.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ converter ──▶ prompt ──▶ client ──▶ normalize
//! (bytes)   (text | images) (payload)  (model)    (ParsedDocument)
//! ```
//!
//! 1. [`input`]     — read a path or download a URL; validate type, size, header
//! 2. [`converter`] — the blocking conversion boundary; [`pdfium`] is the
//!    production implementation and [`encode`] turns rendered pages into
//!    base64 PNG attachments
//! 3. [`prompt`]    — schema + content → system and user messages
//! 4. [`client`]    — the only stage with network I/O
//! 5. [`normalize`] — fence stripping, JSON parse, schema reconciliation

pub mod client;
pub mod converter;
pub mod encode;
pub mod input;
pub mod normalize;
pub mod pdfium;
pub mod prompt;
