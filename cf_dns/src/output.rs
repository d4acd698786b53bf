use chrono::NaiveDateTime;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::render::Report;

/// Where the report goes
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Sink {
    Screen,
    /// A new `<domain>-<timestamp>.txt` file in the given directory
    File(PathBuf),
}

/// `<dir>/<domain>-YYYYMMDD-HHMMSS-mmm.txt`
pub fn report_path(dir: &Path, domain: &str, at: NaiveDateTime) -> PathBuf {
    dir.join(format!("{}-{}.txt", domain, at.format("%Y%m%d-%H%M%S-%3f")))
}

/// Write the report followed by a newline, then flush
pub fn write_report<W: Write>(mut out: W, report: &Report) -> io::Result<()> {
    writeln!(out, "{}", report)?;
    out.flush()
}

/// Send `report` to `sink`. An existing file with the same name is overwritten.
/// Returns the path of the file written, if any.
pub fn deliver(
    report: &Report,
    domain: &str,
    sink: &Sink,
    at: NaiveDateTime,
) -> Result<Option<PathBuf>, Error> {
    match sink {
        Sink::Screen => {
            let stdout = io::stdout();
            write_report(stdout.lock(), report)?;
            Ok(None)
        }
        Sink::File(dir) => {
            let path = report_path(dir, domain, at);
            let file = File::create(&path).map_err(|source| Error::ReportFile {
                path: path.clone(),
                source,
            })?;
            write_report(BufWriter::new(file), report).map_err(|source| Error::ReportFile {
                path: path.clone(),
                source,
            })?;
            Ok(Some(path))
        }
    }
}
