//! Protocol decoding modules.
//!
//! Each protocol keeps the same split:
//! - `layout`: offsets, sizes and tag values (source of truth)
//! - `reader`: bounds-checked byte access
//! - decoders: domain-level parsing built on the reader
//! - `error`: explicit, actionable errors
//!
//! Decoders are pure and contain no I/O; sources and the analysis layer
//! handle file access and aggregation.

pub mod photon;
