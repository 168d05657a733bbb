//! Pipeline orchestration for grayscout.
//!
//! This crate ties together URL discovery, image download, and grayscale
//! conversion into the end-to-end batch run (`pipeline::run`).

pub mod pipeline;
