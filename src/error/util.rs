//! Utility functions for error handling
//!
//! Helpers for reading startup artifacts with errors that name the file and
//! what it was needed for.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Error, Result};

/// Safely read a file to string with rich error information
///
/// # Arguments
/// * `path` - The path to the file to read
/// * `purpose` - Why the file is being read (for error context)
///
/// # Returns
/// * `Result<String>` - The file content or an [`Error::Load`] naming the path
pub fn safe_read_to_string(path: &Path, purpose: &str) -> Result<String> {
    if !path.exists() {
        return Err(load_error(
            path,
            io::Error::new(io::ErrorKind::NotFound, format!("file not found ({purpose})")),
        ));
    }

    if !path.is_file() {
        return Err(load_error(
            path,
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path is not a file ({purpose})"),
            ),
        ));
    }

    fs::read_to_string(path).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::PermissionDenied => "permission denied - check file permissions".to_string(),
            io::ErrorKind::InvalidData => {
                "file contains invalid UTF-8 data - cannot read as text".to_string()
            }
            _ => format!("failed to read file content for: {purpose}"),
        };
        load_error(path, io::Error::new(e.kind(), format!("{context}: {e}")))
    })
}

fn load_error(path: &Path, source: io::Error) -> Error {
    Error::Load {
        path: path.to_path_buf(),
        source,
    }
}
