use std::io::{self, Write};

use ocscan_core::{BatchResult, SessionReport};

/// Write one tab-separated line per matching session
pub fn write_tsv<W: Write>(out: &mut W, reports: &[SessionReport]) -> io::Result<()> {
    for report in reports.iter().filter(|r| r.is_match()) {
        writeln!(out, "{}", report.to_tsv_line())?;
    }
    out.flush()
}

/// Print results to stdout. A closed pipe (e.g. `| head`) is not an error.
pub fn print_tsv(reports: &[SessionReport]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    match write_tsv(&mut lock, reports) {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

pub fn print_json(result: &BatchResult) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
