/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Settings for `thermint-calc`, and the integration defaults shared with
//! `thermint-integrate`.
//!
//! ```yaml
//! timestep: 1.0           # POTIM, in fs
//! masses: { Pt: 195.0 }   # amu; overrides the standard table by symbol
//! reaction-coordinates:
//!   - { name: r1, distance: [0, 1] }   # 0-based atom indices
//!   - { name: r2, distance: [0, 2] }
//!   - { name: d, combination: { r1: 1.0, r2: -1.0 } }
//! report: [d]             # defaults to every constrained coordinate
//! integration:
//!   bin-width: 0.1
//!   region: [0.0, 2.0]
//! ```

use std::collections::BTreeMap;

use crate::YamlRead;

/// Settings as they appear in the file.
///
/// Use [`ValidatedSettings`] to get something the program can act on.
#[derive(Debug, Clone, PartialEq)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// Timestep of the MD run, in fs.
    pub timestep: f64,

    #[serde(default)]
    pub masses: BTreeMap<String, f64>,

    pub reaction_coordinates: Vec<ReactionCoordinate>,

    #[serde(default)]
    pub report: Vec<String>,

    #[serde(default)]
    pub integration: Integration,
}
derive_yaml_read!{Settings}

/// A reaction coordinate as written in the file.  Exactly one of the kinds
/// must be given.
#[derive(Debug, Clone, PartialEq)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReactionCoordinate {
    pub name: String,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<[usize; 2]>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combination: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, PartialEq)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Integration {
    #[serde(default = "_integration__bin_width")]
    pub bin_width: f64,

    /// Only bins whose centers lie strictly inside this interval are kept.
    #[serde(default)]
    pub region: Option<[f64; 2]>,
}
fn _integration__bin_width() -> f64 { 0.1 }

impl Default for Integration {
    fn default() -> Self {
        Integration {
            bin_width: _integration__bin_width(),
            region: None,
        }
    }
}

// --------------------------------------------------------

/// Settings that have passed [`Settings::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSettings {
    pub timestep: f64,
    pub masses: BTreeMap<String, f64>,
    pub reaction_coordinates: Vec<RcConfig>,
    pub report: Vec<String>,
    pub integration: Integration,
}
derive_yaml_read!{ValidatedSettings}

#[derive(Debug, Clone, PartialEq)]
pub struct RcConfig {
    pub name: String,
    pub kind: RcKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RcKind {
    /// Distance between two atoms (0-based indices).
    Distance { atoms: [usize; 2] },
    /// Weighted sum of other reaction coordinates, by name.
    Combination { terms: Vec<(String, f64)> },
}

impl<'de> serde::Deserialize<'de> for ValidatedSettings {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        Settings::deserialize(deserializer)?
            .validate()
            .map_err(D::Error::custom)
    }
}

impl Integration {
    /// Apply command line overrides.
    pub fn with_overrides(mut self, bin_width: Option<f64>, region: Option<[f64; 2]>) -> Self {
        if let Some(bin_width) = bin_width {
            self.bin_width = bin_width;
        }
        if region.is_some() {
            self.region = region;
        }
        self
    }
}
