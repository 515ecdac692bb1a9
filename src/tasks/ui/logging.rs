/* ************************************************************************ **
** This file is part of thermint, and is licensed under EITHER the MIT      **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use log::{Level, LevelFilter};

use crate::FailResult;

const OUR_CRATES: &[&str] = &[
    "thermint",
    "thermint_tasks",
    "thermint_tasks_config",
    "thermint_log_io",
    "thermint_fs_util",
];

lazy_static! {
    static ref LOGFILE: Mutex<Option<BufWriter<File>>> = Mutex::new(None);
}

/// Handle for directing the log into a file once the output directory exists.
pub(crate) struct DelayedLogfile(());

impl DelayedLogfile {
    /// Everything logged from now on is also written to `path`.
    pub(crate) fn start(&self, path: impl AsRef<Path>) -> FailResult<()> {
        let file = thermint_fs_util::create(path)?;
        match LOGFILE.lock() {
            Ok(mut guard) => *guard = Some(file),
            Err(_) => bail!("logfile lock was poisoned"),
        }
        Ok(())
    }
}

struct LogfileSink;

impl log::Log for LogfileSink {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool
    { true }

    fn log(&self, record: &log::Record<'_>) {
        if let Ok(mut guard) = LOGFILE.lock() {
            if let Some(file) = guard.as_mut() {
                // a failing logfile shouldn't take down the run
                let _ = writeln!(file, "{}", record.args());
                let _ = file.flush();
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut guard) = LOGFILE.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Set up the `log` facade. Only call once.
///
/// With `verbose`, thermint's own crates log at `Trace`.
pub(crate) fn init_global_logger(verbose: bool) -> FailResult<DelayedLogfile> {
    use std::time::Instant;

    let ours = match verbose {
        true => LevelFilter::Trace,
        false => LevelFilter::Debug,
    };

    let start = Instant::now();
    let mut fern = fern::Dispatch::new()
        .format(move |out, message, record| {
            let t = start.elapsed();
            out.finish(format_args!("[{:>4}.{:03}s][{}][{}] {}",
                t.as_secs(),
                t.subsec_nanos() / 1_000_000,
                record.target(),
                ColorizedLevel(record.level()),
                message))
        })
        .level(LevelFilter::Info);

    for name in OUR_CRATES {
        fern = fern.level_for(*name, ours);
    }

    fern.chain(std::io::stdout())
        .chain(Box::new(LogfileSink) as Box<dyn log::Log>)
        .apply()?;

    Ok(DelayedLogfile(()))
}

#[derive(Debug, Copy, Clone)]
pub struct ColorizedLevel(pub Level);
impl fmt::Display for ColorizedLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = match self.0 {
            Level::Error => ansi_term::Colour::Red.bold(),
            Level::Warn  => ansi_term::Colour::Red.normal(),
            Level::Info  => ansi_term::Colour::Cyan.bold(),
            Level::Debug => ansi_term::Colour::Yellow.dimmed(),
            Level::Trace => ansi_term::Colour::Cyan.normal(),
        };
        write!(f, "{}", crate::ui::color::paint(style, self.0))
    }
}
