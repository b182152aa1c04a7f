//! Command Line Interface module
//!
//! - `extract`: print the insert statement for the track currently shown on a page
//! - `crawl`: walk an artist listing and collect statements for their top tracks
//! - `dump`: print the statements a previous crawl persisted
//! - `config`: inspect configuration

pub mod config;
pub mod crawl;
pub mod dump;
pub mod extract;

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::Result;

/// Write SQL text to `output`, or stdout when no file is given.
pub fn emit(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(path, text)?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("songs.sql");
        emit(Some(&path), "INSERT 1;\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "INSERT 1;\n");
    }
}
