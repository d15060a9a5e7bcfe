//! WIKAI - institutional memory for AI systems
//!
//! WIKAI captures the stable strategies AI systems discover ("patterns")
//! into a Commons of plain JSON documents, and lets any system query them
//! by tag, text or minimum stability. The [`observer::Observer`] captures
//! patterns passively from an event stream.

pub mod config;
pub mod observer;
pub mod storage;
