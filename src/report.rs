//! Defines [`Report`], the accumulator every check writes its findings into.

use std::io::{self, Write};

/// The width of the horizontal rules framing each report.
pub const RULE_WIDTH: usize = 60;

/// Collects errors and warnings in the order they were found. Errors fail a
/// run; warnings are informational only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Report {
    pub fn new() -> Report {
        Report::default()
    }

    /// Records an error.
    pub fn error<S: Into<String>>(&mut self, message: S) {
        let message = message.into();
        tracing::debug!(%message, "recorded error");
        self.errors.push(message);
    }

    /// Records a warning.
    pub fn warn<S: Into<String>>(&mut self, message: S) {
        let message = message.into();
        tracing::debug!(%message, "recorded warning");
        self.warnings.push(message);
    }

    /// Returns `true` when no errors were recorded. Warnings don't count.
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns `true` when nothing at all was recorded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Writes the errors section, if there are any errors.
    pub fn write_errors<W: Write>(&self, w: &mut W, heading: &str) -> io::Result<()> {
        write_section(w, heading, &self.errors)
    }

    /// Writes the warnings section, if there are any warnings.
    pub fn write_warnings<W: Write>(&self, w: &mut W, heading: &str) -> io::Result<()> {
        write_section(w, heading, &self.warnings)
    }
}

fn write_section<W: Write>(w: &mut W, heading: &str, items: &[String]) -> io::Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(w, "{}", heading)?;
    for item in items {
        writeln!(w, "  • {}", item)?;
    }
    writeln!(w)
}

/// Writes a horizontal rule.
pub fn write_rule<W: Write>(w: &mut W) -> io::Result<()> {
    writeln!(w, "{}", "=".repeat(RULE_WIDTH))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_warnings_do_not_fail() {
        let mut report = Report::new();
        report.warn("draft");
        assert!(report.passed());
        assert!(!report.is_clean());
        report.error("missing title");
        assert!(!report.passed());
    }

    #[test]
    fn test_empty_sections_are_omitted() -> io::Result<()> {
        let mut report = Report::new();
        report.warn("tags is empty");
        let mut out = Vec::new();
        report.write_errors(&mut out, "Errors:")?;
        report.write_warnings(&mut out, "Warnings:")?;
        assert_eq!(
            String::from_utf8_lossy(&out),
            "Warnings:\n  • tags is empty\n\n"
        );
        Ok(())
    }
}
