//! Utility helpers: file discovery, digests and output paths.
pub mod files;

pub use files::{collect_files, file_digest, slugify, write_file};
