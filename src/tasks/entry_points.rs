/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! The `main` of each binary.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use path_abs::PathFile;
use thermint_fs_util as fsx;
use thermint_log_io::dat::ColumnSpec;
use thermint_tasks_config::{Integration, ValidatedSettings, YamlRead};

use crate::FailResult;
use crate::cmd::{self, IntegrateOptions, ReportOptions};
use crate::ui::cli_deserialize::CliDeserialize;
use crate::ui::logging::{DelayedLogfile, init_global_logger};
use crate::util::ArgMatchesExt;

fn wrap_result_main<F>(main: F)
where F: FnOnce() -> FailResult<()>,
{
    main().unwrap_or_else(|e| {
        // no logger means nothing would be printed
        let logging = log::max_level() != log::LevelFilter::Off;
        for line in error_lines(&e) {
            match logging {
                true => error!("{}", line),
                false => eprintln!("Error: {}", line),
            }
        }
        std::process::exit(1);
    });
}

fn error_lines(e: &failure::Error) -> Vec<String> {
    let mut lines: Vec<String> = e.iter_chain().map(|cause| cause.to_string()).collect();
    if std::env::var_os("RUST_BACKTRACE") == Some(OsStr::new("1").to_owned()) {
        lines.push(e.backtrace().to_string());
    } else {
        lines.push("(for a backtrace, try again with RUST_BACKTRACE=1)".to_string());
    }
    lines
}

fn existing_file(path: &str) -> FailResult<PathBuf> {
    let file = PathFile::new(path)?;
    let path: &Path = file.as_ref();
    Ok(path.to_path_buf())
}

fn input_file(m: &clap::ArgMatches<'_>, name: &str) -> FailResult<PathBuf>
{ existing_file(&m.expect_value_of(name)) }

struct Verbosity(bool);

impl CliDeserialize for Verbosity {
    fn _augment_clap_app<'a, 'b>(app: clap::App<'a, 'b>) -> clap::App<'a, 'b>
    { app.arg(arg!( verbose [-v][--verbose] "log everything thermint does, step by step")) }

    fn _resolve_args(m: &clap::ArgMatches<'_>) -> FailResult<Self>
    { Ok(Verbosity(m.is_present("verbose"))) }
}

/// `-o OUTDIR [-f]`
struct OutputDirArgs {
    outdir: PathBuf,
    replace: bool,
}

impl CliDeserialize for OutputDirArgs {
    fn _augment_clap_app<'a, 'b>(app: clap::App<'a, 'b>) -> clap::App<'a, 'b> {
        app.args(&[
            arg!(*outdir [-o][--output]=OUTDIR "output directory"),
            arg!( force [-f][--force] "replace an existing output directory"),
        ])
    }

    fn _resolve_args(m: &clap::ArgMatches<'_>) -> FailResult<Self>
    { Ok(OutputDirArgs {
        outdir: PathBuf::from(m.expect_value_of("outdir")),
        replace: m.is_present("force"),
    })}
}

impl OutputDirArgs {
    /// Create the directory and send the log there too.
    fn create(&self, logfile: &DelayedLogfile) -> FailResult<PathBuf> {
        let dir = fsx::fresh_output_dir(&self.outdir, self.replace)?;
        logfile.start(dir.join(cmd::LOGFILE))?;
        Ok(dir)
    }
}

/// `-n N`
struct StepLimit(Option<usize>);

impl CliDeserialize for StepLimit {
    fn _augment_clap_app<'a, 'b>(app: clap::App<'a, 'b>) -> clap::App<'a, 'b>
    { app.arg(arg!( steps [-n][--steps]=N "read at most N steps (rows); a shorter file is only a warning")) }

    fn _resolve_args(m: &clap::ArgMatches<'_>) -> FailResult<Self>
    { Ok(StepLimit(m.parse_value_of("steps")?)) }
}

/// `--ncons K`
struct ConstraintCount(Option<usize>);

impl CliDeserialize for ConstraintCount {
    fn _augment_clap_app<'a, 'b>(app: clap::App<'a, 'b>) -> clap::App<'a, 'b>
    { app.arg(arg!( ncons [--ncons]=K "number of reaction coordinates the log must have")) }

    fn _resolve_args(m: &clap::ArgMatches<'_>) -> FailResult<Self>
    { Ok(ConstraintCount(m.parse_value_of("ncons")?)) }
}

impl CliDeserialize for IntegrateOptions {
    fn _augment_clap_app<'a, 'b>(app: clap::App<'a, 'b>) -> clap::App<'a, 'b> {
        app.args(&[
            arg!(?config [-c][--config]=SETTINGS "settings yaml; only its 'integration' section is used"),
            arg!( bin_width [--bin-width]=WIDTH "bin width [default: 0.1]"),
            arg!(?region [--region]=LO "integrate only bins centred strictly inside (LO, HI)")
                .number_of_values(2)
                .value_names(&["LO", "HI"])
                .allow_hyphen_values(true),
            arg!( coord_col [--coord-col]=C "0-based column of the coordinate [default: 1]"),
            arg!( grad_col [--grad-col]=G "0-based column of the gradient [default: 2]"),
            arg!( no_bins [--no-bins] "integrate row by row into TI.dat instead of binning"),
        ])
    }

    fn _resolve_args(m: &clap::ArgMatches<'_>) -> FailResult<Self> {
        let integration = match m.value_of("config") {
            Some(path) => ValidatedSettings::from_reader(fsx::open_text(path)?)?.integration,
            None => Integration::default(),
        };
        let region = match m.parse_values_of::<f64>("region")? {
            Some(values) => match values[..] {
                [lo, hi] => Some([lo, hi]),
                _ => bail!("--region takes two values"),
            },
            None => None,
        };
        let integration = integration.with_overrides(m.parse_value_of("bin_width")?, region);
        integration.validate()?;

        let defaults = ColumnSpec::default();
        let columns = ColumnSpec {
            step: defaults.step,
            coord: m.parse_value_of("coord_col")?.unwrap_or(defaults.coord),
            gradient: m.parse_value_of("grad_col")?.unwrap_or(defaults.gradient),
        };
        ensure!(columns.coord != columns.gradient, "--coord-col and --grad-col must differ");

        Ok(IntegrateOptions {
            max_rows: None,
            columns,
            integration,
            unbinned: m.is_present("no_bins"),
        })
    }
}

impl CliDeserialize for ReportOptions {
    fn _augment_clap_app<'a, 'b>(app: clap::App<'a, 'b>) -> clap::App<'a, 'b> {
        app.args(&[
            arg!( drop [--drop]=D "equilibration steps left out of statistics and US-drop.dat"),
            arg!( stat_interval [--stat-interval]=I "write BM-STAT-<k>.dat with a row every I steps"),
        ])
    }

    fn _resolve_args(m: &clap::ArgMatches<'_>) -> FailResult<Self> {
        let stat_interval = m.parse_value_of::<usize>("stat_interval")?;
        ensure!(stat_interval != Some(0), "--stat-interval must be positive");
        Ok(ReportOptions {
            max_steps: None,
            ncons: None,
            drop: m.parse_value_of("drop")?.unwrap_or(0),
            stat_interval,
        })
    }
}

// -------------------------------------------------------------------------------------

pub fn calc() {
    wrap_result_main(|| {
        let (app, de) = CliDeserialize::augment_clap_app({
            clap::App::new("thermint-calc")
                .about("Thermodynamic forces along constrained reaction coordinates.")
                .args(&[
                    arg!(*config [-c][--config]=SETTINGS "settings yaml"),
                    arg!(*poscar [--poscar]=POSCAR "POSCAR of the run (lattice and species)"),
                    arg!( input=TRAJECTORY "fort.129 trajectory"),
                ])
        });
        let matches = app.get_matches();
        let logfile = init_global_logger(matches.is_present("verbose"))?;
        let (Verbosity(_), (out @ OutputDirArgs { .. }, StepLimit(max_steps))) = de.resolve_args(&matches)?;

        let settings_path = input_file(&matches, "config")?;
        let poscar = input_file(&matches, "poscar")?;
        let input = input_file(&matches, "input")?;
        let settings = ValidatedSettings::from_reader(fsx::open_text(&settings_path)?)?;

        let outdir = out.create(&logfile)?;
        // keep the settings next to the results
        std::io::copy(&mut fsx::open(&settings_path)?, &mut fsx::create(outdir.join("settings.yaml"))?)?;

        cmd::run_calc(&settings, &poscar, &input, max_steps, &outdir)?;
        Ok(())
    });
}

pub fn integrate() {
    wrap_result_main(|| {
        let (app, de) = CliDeserialize::augment_clap_app({
            clap::App::new("thermint-integrate")
                .about("Bin a gradient table and integrate it into a free-energy profile.")
                .args(&[
                    arg!( input=DAT "table of (step, coordinate, gradient) rows, e.g. THFO-<rc>.dat"),
                ])
        });
        let matches = app.get_matches();
        let logfile = init_global_logger(matches.is_present("verbose"))?;
        let (Verbosity(_), (out @ OutputDirArgs { .. }, (StepLimit(max_rows), options @ IntegrateOptions { .. }))) = de.resolve_args(&matches)?;
        let options = IntegrateOptions { max_rows, ..options };

        let input = input_file(&matches, "input")?;
        let outdir = out.create(&logfile)?;
        cmd::run_integrate(&input, &options, &outdir)?;
        Ok(())
    });
}

pub fn report() {
    wrap_result_main(|| {
        let (app, de) = CliDeserialize::augment_clap_app({
            clap::App::new("thermint-report")
                .about("Tables and statistics from a VASP REPORT.")
                .args(&[
                    arg!( input=REPORT "VASP REPORT file").required_unless("metadata"),
                    arg!(?metadata [--metadata]=FILE "\
                        umbrella-sampling METADATA file; the REPORT beside each listed table \
                        is processed and the table written in place\
                    ").conflicts_with_all(&["input", "outdir"]),
                    arg!(?outdir [-o][--output]=OUTDIR "output directory").required_unless("metadata"),
                    arg!( force [-f][--force] "replace an existing output directory"),
                ])
        });
        let matches = app.get_matches();
        let logfile = init_global_logger(matches.is_present("verbose"))?;
        let (Verbosity(_), (StepLimit(max_steps), (ConstraintCount(ncons), options @ ReportOptions { .. }))) = de.resolve_args(&matches)?;
        let options = ReportOptions { max_steps, ncons, ..options };

        if let Some(metadata) = matches.value_of("metadata") {
            let metadata = existing_file(metadata)?;
            cmd::run_metadata(&metadata, &options)?;
            return Ok(());
        }

        let input = input_file(&matches, "input")?;
        let out = OutputDirArgs {
            outdir: PathBuf::from(matches.expect_value_of("outdir")),
            replace: matches.is_present("force"),
        };
        let outdir = out.create(&logfile)?;
        cmd::run_report(&input, &options, &outdir)?;
        Ok(())
    });
}

pub fn tfilog() {
    wrap_result_main(|| {
        let (app, de) = CliDeserialize::augment_clap_app({
            clap::App::new("thermint-tfilog")
                .about("Split a TFILOG into one THFO-<k>.dat per reaction coordinate.")
                .args(&[
                    arg!( input=TFILOG "TFILOG file"),
                ])
        });
        let matches = app.get_matches();
        let logfile = init_global_logger(matches.is_present("verbose"))?;
        let (Verbosity(_), (out @ OutputDirArgs { .. }, (StepLimit(max_steps), ConstraintCount(ncons)))) = de.resolve_args(&matches)?;

        let input = input_file(&matches, "input")?;
        let outdir = out.create(&logfile)?;
        cmd::run_tfilog(&input, ncons, max_steps, &outdir)?;
        Ok(())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve<A: CliDeserialize>(args: &[&str]) -> FailResult<A> {
        let (app, de) = CliDeserialize::augment_clap_app(clap::App::new("thermint-test"));
        let matches = app.get_matches_from_safe(args).unwrap();
        de.resolve_args(&matches)
    }

    #[test]
    fn bad_arguments_name_the_flag() {
        let err = match resolve::<(Verbosity, (OutputDirArgs, StepLimit))>(&["thermint-test", "-v", "-o", "out", "-n", "abc"]) {
            Ok(_) => panic!("-n abc was accepted"),
            Err(e) => e,
        };
        let lines = error_lines(&err);
        assert!(lines[0].contains("--steps") && lines[0].contains("\"abc\""), "{:?}", lines);
        assert!(lines.len() >= 2);

        let err = match resolve::<IntegrateOptions>(&["thermint-test", "--coord-col", "2"]) {
            Ok(_) => panic!("equal columns were accepted"),
            Err(e) => e,
        };
        assert!(error_lines(&err)[0].contains("--coord-col"));
    }

    #[test]
    fn verbosity_is_readable_before_resolving() {
        // the logger is set up from this flag alone, before anything can fail
        let (app, _de) = <(Verbosity, IntegrateOptions)>::augment_clap_app(clap::App::new("thermint-test"));
        let matches = app.get_matches_from_safe(&["thermint-test", "-v", "--bin-width", "0"]).unwrap();
        assert!(matches.is_present("verbose"));
        assert!(IntegrateOptions::_resolve_args(&matches).is_err());
    }

    #[test]
    fn existing_files_only() {
        let dir = tempdir::TempDir::new("thermint-entry").unwrap();
        let path = dir.path().join("input.dat");
        thermint_fs_util::create(&path).unwrap();
        let text = path.to_str().unwrap();
        assert!(existing_file(text).unwrap().ends_with("input.dat"));
        assert!(existing_file(&format!("{}.missing", text)).is_err());
    }
}
