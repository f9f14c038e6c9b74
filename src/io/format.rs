//! Layout of the dbnet report.

use std::fmt;

use log;

/// Width of the rules framing a report section.
const REPORT_WIDTH: usize = 80;

/// Logs a warning to the `dbnet-output` logger.
macro_rules! dbnet_warn {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::warn!(target: "dbnet-output", $fmt, $($($arg)*)?); }
}

/// Logs a report line to the `dbnet-output` logger.
macro_rules! dbnet_output {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::info!(target: "dbnet-output", $fmt, $($($arg)*)?); }
}

pub(crate) use {dbnet_output, dbnet_warn};

/// Returns a heading and the rule drawn beneath it.
fn underlined(heading: &str) -> [String; 2] {
    [heading.to_string(), "═".repeat(heading.chars().count())]
}

/// Logs a section title between two full-width rules.
pub(crate) fn log_title(title: &str) {
    let width = REPORT_WIDTH.max(title.chars().count());
    let rule = "━".repeat(width);
    dbnet_output!("{rule}");
    dbnet_output!("{title:^width$}");
    dbnet_output!("{rule}");
}

/// Writes an underlined heading.
pub(crate) fn write_subtitle(f: &mut fmt::Formatter<'_>, subtitle: &str) -> fmt::Result {
    underlined(subtitle)
        .iter()
        .try_for_each(|line| writeln!(f, "{line}"))
}

/// Logs an underlined heading.
pub(crate) fn log_subtitle(subtitle: &str) {
    for line in underlined(subtitle) {
        dbnet_output!("{line}");
    }
}

/// Anything whose [`fmt::Display`] output forms part of the report.
pub(crate) trait ReportSection: fmt::Display {
    /// Logs the displayed form line by line.
    fn log_report(&self) {
        for line in self.to_string().lines() {
            dbnet_output!("{line}");
        }
    }
}

impl<T: fmt::Display> ReportSection for T {}
