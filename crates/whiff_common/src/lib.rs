//! Shared foundational types for the whiff MIME classification engine.
//!
//! This crate provides the bounds-checked big-endian byte-buffer accessor used
//! by the `mime.cache` parser, and the well-known sentinel MIME type names
//! shared by the resolver and the CLI.

#![warn(missing_docs)]

pub mod view;
pub mod wellknown;

pub use view::ByteView;
