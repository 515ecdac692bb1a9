/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::FailResult;

/// Trait used to factor out code for adding arguments to a binary and parsing them,
/// leveraging type inference to help reduce boilerplate.
pub trait CliDeserialize: Sized {
    fn augment_clap_app<'a, 'b>(app: clap::App<'a, 'b>) -> (clap::App<'a, 'b>, ClapDeserializer<Self>)
    {
        let app = Self::_augment_clap_app(app);
        let token = ClapDeserializer(Default::default());
        (app, token)
    }

    /// Don't use this. Call 'augment_clap_app' instead.
    fn _augment_clap_app<'a, 'b>(app: clap::App<'a, 'b>) -> clap::App<'a, 'b>;
    /// Don't use this. Call 'resolve_args' on the ClapDeserializer instead.
    fn _resolve_args(matches: &clap::ArgMatches<'_>) -> FailResult<Self>;
}

/// Token of "proof" that a clap app was augmented to be capable of deserializing A.
pub struct ClapDeserializer<A>(std::marker::PhantomData<A>);

impl<A> ClapDeserializer<A>
where A: CliDeserialize,
{
    /// Deserialize the arguments.  This may perform IO such as eagerly reading input files.
    pub fn resolve_args(self, matches: &clap::ArgMatches<'_>) -> FailResult<A>
    { A::_resolve_args(matches) }
}

// Tuple as product combinator
impl<A, B> CliDeserialize for (A, B)
where
    A: CliDeserialize,
    B: CliDeserialize,
{
    fn _augment_clap_app<'a, 'b>(app: clap::App<'a, 'b>) -> clap::App<'a, 'b>
    {
        let app = A::_augment_clap_app(app);
        let app = B::_augment_clap_app(app);
        app
    }

    fn _resolve_args(matches: &clap::ArgMatches<'_>) -> FailResult<Self>
    { Ok((A::_resolve_args(matches)?, B::_resolve_args(matches)?)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Width(Option<f64>);
    struct Force(bool);

    impl CliDeserialize for Width {
        fn _augment_clap_app<'a, 'b>(app: clap::App<'a, 'b>) -> clap::App<'a, 'b>
        { app.arg(arg!( width [--width]=W "")) }

        fn _resolve_args(m: &clap::ArgMatches<'_>) -> FailResult<Self> {
            match m.value_of("width") {
                None => Ok(Width(None)),
                Some(s) => Ok(Width(Some(s.parse()?))),
            }
        }
    }

    impl CliDeserialize for Force {
        fn _augment_clap_app<'a, 'b>(app: clap::App<'a, 'b>) -> clap::App<'a, 'b>
        { app.arg(arg!( force [-f][--force] "")) }

        fn _resolve_args(m: &clap::ArgMatches<'_>) -> FailResult<Self>
        { Ok(Force(m.is_present("force"))) }
    }

    #[test]
    fn product() {
        let (app, de) = CliDeserialize::augment_clap_app(clap::App::new("test"));
        let matches = app.get_matches_from(vec!["test", "--width", "0.5", "-f"]);
        let (Width(width), Force(force)) = de.resolve_args(&matches).unwrap();
        assert_eq!(width, Some(0.5));
        assert!(force);
    }
}
