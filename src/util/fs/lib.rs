/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Thin wrappers around `std::fs` whose errors name the offending path.
//!
//! A bare "No such file or directory" is useless when a run touches a POSCAR,
//! a trajectory, a settings file and an output directory.

#[macro_use]
extern crate log;

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{}: '{}'", .action, .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("output directory already exists (use --force to replace it): '{}'", .0.display())]
    AlreadyExists(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;

trait ResultExt<T> {
    fn with_path(self, action: &'static str, path: &Path) -> Result<T>;
}

impl<T> ResultExt<T> for io::Result<T> {
    fn with_path(self, action: &'static str, path: &Path) -> Result<T> {
        self.map_err(|source| Error::Io { action, path: path.to_owned(), source })
    }
}

/// Wrapper around `File::open` that adds context.
pub fn open(path: impl AsRef<Path>) -> Result<File> {
    let path = path.as_ref();
    File::open(path).with_path("could not open file", path)
}

/// Wrapper around `File::open` that adds context and makes a `BufReader`.
pub fn open_text(path: impl AsRef<Path>) -> Result<BufReader<File>> {
    open(path).map(BufReader::new)
}

/// Wrapper around `File::create` that adds context and makes a `BufWriter`.
pub fn create(path: impl AsRef<Path>) -> Result<BufWriter<File>> {
    let path = path.as_ref();
    File::create(path).with_path("could not create file", path).map(BufWriter::new)
}

/// Wrapper around `std::fs::create_dir_all` that adds context.
pub fn create_dir_all(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_path("could not create directory", dir)
}

/// Simulates `rm -rf`.
///
/// * Deletes files and folders alike.
/// * Does not require the path to exist.
/// * Does **not** follow symbolic links.
pub fn rm_rf(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(ref e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).with_path("could not stat", path),
    };

    match meta.is_dir() {
        true => fs::remove_dir_all(path).with_path("could not delete directory", path),
        false => fs::remove_file(path).with_path("could not delete file", path),
    }
}

/// Create an output directory for a run.
///
/// An existing directory is an error unless `replace` is set, in which case
/// it is deleted first.
pub fn fresh_output_dir(dir: impl AsRef<Path>, replace: bool) -> Result<PathBuf> {
    let dir = dir.as_ref();
    if dir.exists() {
        if !replace {
            return Err(Error::AlreadyExists(dir.to_owned()));
        }
        warn!("Replacing existing output directory '{}'", dir.display());
        rm_rf(dir)?;
    }
    create_dir_all(dir)?;
    Ok(dir.to_owned())
}
