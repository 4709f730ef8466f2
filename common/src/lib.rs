//! Shared building blocks for the workspace: dense 2-D buffers, config file
//! format detection and logging setup.

pub mod buffer2;
pub mod file_format;
pub mod log_setup;

pub use buffer2::Buffer2;
pub use file_format::{FileExtensionError, SerdeFormat};
