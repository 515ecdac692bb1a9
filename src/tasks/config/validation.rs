/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use std::collections::BTreeSet;

use failure::Error;

use crate::config::*;

impl Settings {
    /// Checks that only need the file itself.
    ///
    /// References between coordinates (unknown names, cycles) and atom
    /// indices are checked once the structure is known.
    pub fn validate(self) -> Result<ValidatedSettings, Error> {
        let Settings { timestep, masses, reaction_coordinates, report, integration } = self;

        ensure!(timestep.is_finite() && timestep > 0.0, "timestep must be positive, got {}", timestep);
        for (symbol, &mass) in &masses {
            ensure!(mass.is_finite() && mass > 0.0, "mass of {} must be positive, got {}", symbol, mass);
        }

        ensure!(!reaction_coordinates.is_empty(), "at least one reaction coordinate is required");
        let mut names = BTreeSet::new();
        let reaction_coordinates = reaction_coordinates.into_iter()
            .map(|rc| {
                let rc = rc.validate()?;
                ensure!(names.insert(rc.name.clone()), "reaction coordinate {:?} is defined twice", rc.name);
                Ok(rc)
            })
            .collect::<Result<Vec<_>, Error>>()?;

        for name in &report {
            ensure!(names.contains(name), "report: no reaction coordinate named {:?}", name);
        }

        integration.validate()?;

        Ok(ValidatedSettings { timestep, masses, reaction_coordinates, report, integration })
    }
}

impl ReactionCoordinate {
    fn validate(self) -> Result<RcConfig, Error> {
        let ReactionCoordinate { name, distance, combination } = self;

        // the name must survive a round trip through a TFILOG
        ensure!(!name.is_empty(), "reaction coordinate names cannot be empty");
        ensure!(
            !name.contains(char::is_whitespace),
            "reaction coordinate name {:?} contains whitespace", name,
        );

        let kind = match (distance, combination) {
            (Some(atoms), None) => {
                ensure!(atoms[0] != atoms[1], "{}: distance between atom {} and itself", name, atoms[0]);
                RcKind::Distance { atoms }
            },
            (None, Some(terms)) => {
                ensure!(!terms.is_empty(), "{}: empty combination", name);
                for (term, &coeff) in &terms {
                    ensure!(coeff.is_finite(), "{}: coefficient of {} is not finite", name, term);
                }
                RcKind::Combination { terms: terms.into_iter().collect() }
            },
            (None, None) => bail!("{}: one of 'distance' or 'combination' is required", name),
            (Some(_), Some(_)) => bail!("{}: 'distance' and 'combination' are mutually exclusive", name),
        };
        Ok(RcConfig { name, kind })
    }
}

impl Integration {
    pub fn validate(&self) -> Result<(), Error> {
        ensure!(
            self.bin_width.is_finite() && self.bin_width > 0.0,
            "bin width must be positive, got {}", self.bin_width,
        );
        if let Some([lo, hi]) = self.region {
            ensure!(lo < hi, "empty region [{}, {}]", lo, hi);
        }
        Ok(())
    }
}
