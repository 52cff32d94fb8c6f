//! Modules layer - Infrastructure components
//!
//! Contains adapters for the local file store and signed download links.

pub mod storage;
