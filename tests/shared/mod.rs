/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::io::{BufRead, Read};
use std::path::{Path, PathBuf};

use tempdir::TempDir;
use thermint_fs_util as fsx;

pub fn resource(path: &str) -> PathBuf
{ Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/resources").join(path) }

pub fn scratch(prefix: &str) -> TempDir
{ TempDir::new(prefix).unwrap() }

/// A fresh directory inside `tmp`, like the binaries make with `-o`.
pub fn outdir(tmp: &TempDir, name: &str) -> PathBuf
{ fsx::fresh_output_dir(tmp.path().join(name), false).unwrap() }

pub fn read_text(path: impl AsRef<Path>) -> String {
    let mut s = String::new();
    fsx::open(path).unwrap().read_to_string(&mut s).unwrap();
    s
}

pub fn write_text(path: impl AsRef<Path>, text: &str) {
    use std::io::Write;
    let mut w = fsx::create(path).unwrap();
    w.write_all(text.as_bytes()).unwrap();
}

/// The `#` lines of a `.dat` table.
pub fn comments(path: impl AsRef<Path>) -> Vec<String> {
    fsx::open_text(path).unwrap().lines()
        .map(|line| line.unwrap())
        .filter(|line| line.starts_with('#'))
        .collect()
}

/// The numbers of a `.dat` table, `NaN` included.
pub fn table(path: impl AsRef<Path>) -> Vec<Vec<f64>> {
    fsx::open_text(path).unwrap().lines()
        .map(|line| line.unwrap())
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(|line| line.split_whitespace().map(|w| w.parse().unwrap()).collect())
        .collect()
}

/// One column of `table`.
pub fn column(rows: &[Vec<f64>], k: usize) -> Vec<f64>
{ rows.iter().map(|row| row[k]).collect() }
