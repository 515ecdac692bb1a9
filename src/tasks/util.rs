/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use std::str::FromStr;

use crate::FailResult;

pub(crate) trait ArgMatchesExt {
    /// For args that clap has already checked are present.
    fn expect_value_of(&self, s: &str) -> String;

    /// Parse an optional value, naming the flag in the error.
    fn parse_value_of<T>(&self, s: &str) -> FailResult<Option<T>>
    where T: FromStr, T::Err: std::fmt::Display;

    /// Parse every value of an optional arg.
    fn parse_values_of<T>(&self, s: &str) -> FailResult<Option<Vec<T>>>
    where T: FromStr, T::Err: std::fmt::Display;
}

impl<'a> ArgMatchesExt for clap::ArgMatches<'a> {
    fn expect_value_of(&self, s: &str) -> String
    { self.value_of(s).unwrap_or_else(|| panic!("BUG! ({} was required)", s)).into() }

    fn parse_value_of<T>(&self, s: &str) -> FailResult<Option<T>>
    where T: FromStr, T::Err: std::fmt::Display,
    {
        match self.value_of(s) {
            None => Ok(None),
            Some(text) => match text.parse() {
                Ok(x) => Ok(Some(x)),
                Err(e) => bail!("invalid value {:?} for --{}: {}", text, s.replace('_', "-"), e),
            },
        }
    }

    fn parse_values_of<T>(&self, s: &str) -> FailResult<Option<Vec<T>>>
    where T: FromStr, T::Err: std::fmt::Display,
    {
        match self.values_of(s) {
            None => Ok(None),
            Some(values) => values
                .map(|text| match text.parse() {
                    Ok(x) => Ok(x),
                    Err(e) => bail!("invalid value {:?} for --{}: {}", text, s.replace('_', "-"), e),
                })
                .collect::<FailResult<Vec<T>>>()
                .map(Some),
        }
    }
}
