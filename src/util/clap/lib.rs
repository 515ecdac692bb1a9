/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

pub extern crate clap;

/// Shorthand for building a `clap::Arg`.
///
/// ```text
/// arg!(*output [-o][--output]=OUTDIR "output directory")   required option
/// arg!( bin_width [--bin-width]=WIDTH "bin width")         optional option
/// arg!(?region [--region]=X... "...")                      explicitly optional
/// arg!( force [-f][--force] "replace existing output")    flag
/// arg!( input=REPORT "VASP REPORT file")                   positional (required)
/// ```
///
/// Every option that takes a value takes exactly one per occurrence, so
/// `--region 1.0 --region 2.0` is how multiple values are given.
#[macro_export]
macro_rules! arg {
    // options, in any order
    (@opts $n:tt (positional) ($($acc:tt)*) [$($o:tt)+] $($rest:tt)*) => {
        $crate::arg!{@opts $n (optional) ($($acc)*) [$($o)+] $($rest)*}
    };
    (@opts $n:tt ($req:ident) ($($acc:tt)*) [- - $($long:tt)+] $($rest:tt)*) => {
        $crate::arg!{@opts $n ($req) ($($acc)* .long(concat!($(stringify!($long)),+))) $($rest)*}
    };
    (@opts $n:tt ($req:ident) ($($acc:tt)*) [- $short:ident] $($rest:tt)*) => {
        $crate::arg!{@opts $n ($req) ($($acc)* .short(stringify!($short))) $($rest)*}
    };
    (@opts $n:tt ($req:ident) ($($acc:tt)*) = $value:ident $($rest:tt)*) => {
        $crate::arg!{@opts $n ($req) ($($acc)*
            .takes_value(true)
            .value_name(stringify!($value))
            .number_of_values(1)
        ) $($rest)*}
    };
    (@opts $n:tt ($req:ident) ($($acc:tt)*) ... $($rest:tt)*) => {
        $crate::arg!{@opts $n ($req) ($($acc)* .multiple(true)) $($rest)*}
    };
    (@opts $n:tt ($req:ident) ($($acc:tt)*) $help:expr) => {
        $crate::arg!{@build $n ($req) ($($acc)* .help($help))}
    };
    (@opts $n:tt ($req:ident) ($($acc:tt)*)) => {
        $crate::arg!{@build $n ($req) ($($acc)*)}
    };

    (@build [$name:ident] ($req:ident) ($($acc:tt)*)) => {
        $crate::clap::Arg::with_name(stringify!($name))
            .required($crate::arg!(@required $req))
            $($acc)*
    };
    (@required required) => { true };
    (@required optional) => { false };
    (@required positional) => { true };

    // entry points
    (* $name:ident $($rest:tt)*) => { $crate::arg!{@opts [$name] (required) () $($rest)*} };
    (? $name:ident $($rest:tt)*) => { $crate::arg!{@opts [$name] (optional) () $($rest)*} };
    ($name:ident $($rest:tt)*) => { $crate::arg!{@opts [$name] (positional) () $($rest)*} };
}

#[cfg(test)]
mod tests {
    #[test]
    fn forms_build() {
        let _ = arg!(*output [-o][--output]=OUTDIR "output directory");
        let _ = arg!(*config [-c][--config]=SETTINGS "settings yaml");
        let _ = arg!( input=REPORT "REPORT file");
        let _ = arg!( force [-f][--force] "replace existing output directories");
        let _ = arg!( bin_width [--bin-width]=WIDTH "bin width");
        let _ = arg!(?region [--region]=COORD... "integration window");
        let _ = arg!( verbose [-v][--verbose]);
    }

    #[test]
    fn parses_like_it_reads() {
        let app = ::clap::App::new("thermint-test").args(&[
            arg!(*output [-o][--output]=OUTDIR "output directory"),
            arg!( bin_width [--bin-width]=WIDTH "bin width"),
            arg!( force [-f][--force] "replace"),
            arg!( input=DAT "data file"),
        ]);
        let m = app.get_matches_from(vec![
            "thermint-test", "-o", "out", "--bin-width", "0.05", "THFO-1.dat",
        ]);
        assert_eq!(m.value_of("output"), Some("out"));
        assert_eq!(m.value_of("bin_width"), Some("0.05"));
        assert_eq!(m.value_of("input"), Some("THFO-1.dat"));
        assert!(!m.is_present("force"));
    }

    #[test]
    fn positional_is_required() {
        let app = ::clap::App::new("thermint-test").args(&[arg!( input=DAT "data file")]);
        assert!(app.get_matches_from_safe(vec!["thermint-test"]).is_err());
    }
}
