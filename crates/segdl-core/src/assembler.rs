//! Concatenate downloaded segments into one intermediate file.
//!
//! Output is written to `<output>.part` and renamed into place only after the
//! last byte is flushed, so `output` is either complete or absent.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use crate::error::{AssembleError, MissingSegmentError};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Byte-concatenate `paths`, in the order given, into `output`. Returns the
/// number of bytes written. Fails with `MissingSegment` if any input is gone;
/// the partial output is removed on every failure.
pub fn assemble(paths: &[PathBuf], output: &Path) -> Result<u64, AssembleError> {
    let tmp = temp_path(output);
    let result = write_concat(paths, &tmp).and_then(|written| {
        std::fs::rename(&tmp, output).map_err(|source| AssembleError::Io {
            path: output.to_path_buf(),
            source,
        })?;
        Ok(written)
    });
    match result {
        Ok(written) => {
            tracing::info!(
                segments = paths.len(),
                bytes = written,
                output = %output.display(),
                "assembled"
            );
            Ok(written)
        }
        Err(e) => {
            let _ = std::fs::remove_file(&tmp);
            Err(e)
        }
    }
}

fn write_concat(paths: &[PathBuf], tmp: &Path) -> Result<u64, AssembleError> {
    let io_err = |source| AssembleError::Io {
        path: tmp.to_path_buf(),
        source,
    };
    let mut out = BufWriter::new(File::create(tmp).map_err(io_err)?);
    let mut written = 0u64;
    for path in paths {
        let mut input = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(MissingSegmentError { path: path.clone() }.into());
            }
            Err(source) => {
                return Err(AssembleError::Io {
                    path: path.clone(),
                    source,
                })
            }
        };
        written += io::copy(&mut input, &mut out).map_err(|source| AssembleError::Io {
            path: path.clone(),
            source,
        })?;
    }
    let file = out.into_inner().map_err(|e| io_err(e.into_error()))?;
    file.sync_all().map_err(io_err)?;
    Ok(written)
}

/// Remove segment files after a successful assembly. Missing files are
/// ignored; returns how many were removed.
pub fn cleanup_segments(paths: &[PathBuf]) -> usize {
    let mut removed = 0;
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("could not remove {}: {}", path.display(), e),
        }
    }
    removed
}
