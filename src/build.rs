//! Exports [`BuildValidator`], which checks that the blog builds: that the
//! project layout is intact, that the build command succeeds
//! ([`crate::process`]), and that the build wrote the expected files to the
//! output directory.

use crate::config::Config;
use crate::process::{self, Output};
use crate::report::{write_rule, Report};
use crate::util::{group_digits, megabytes};
use std::io::{self, Write};
use std::path::Path;
use walkdir::WalkDir;

/// Runs the build checks for one project and accumulates their findings.
pub struct BuildValidator {
    pub config: Config,

    /// When set, the build command isn't run and the output directory is
    /// checked as it already exists on disk.
    pub skip_build: bool,

    pub report: Report,
}

/// File totals for a directory tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutputStats {
    pub files: u64,
    pub bytes: u64,
}

impl BuildValidator {
    pub fn new(config: Config, skip_build: bool) -> BuildValidator {
        BuildValidator {
            config,
            skip_build,
            report: Report::new(),
        }
    }

    /// Runs every step in order, writing progress to `w`. A failing step
    /// stops the steps after it. Returns `true` iff no errors were recorded.
    pub fn validate<W: Write>(&mut self, w: &mut W) -> io::Result<bool> {
        writeln!(w, "🔨 Blog build check\n")?;
        writeln!(
            w,
            "Project directory: {}\n",
            self.config.project_root.display()
        )?;

        if !self.check_structure(w)? {
            return Ok(false);
        }

        if self.skip_build {
            writeln!(w, "⏭️  Skipping the build step\n")?;
        } else if !self.run_build(w)? {
            return Ok(false);
        }

        if !self.check_output(w)? {
            return Ok(false);
        }

        Ok(self.report.passed())
    }

    /// Checks every required path, reporting all of the missing ones.
    fn check_structure<W: Write>(&mut self, w: &mut W) -> io::Result<bool> {
        writeln!(w, "📁 Checking project structure...")?;
        for path in &self.config.required_paths {
            if self.config.resolve(path).exists() {
                writeln!(w, "  ✅ {}", path.display())?;
            } else {
                self.report.error(format!(
                    "missing required file or directory: {}",
                    path.display()
                ));
                writeln!(w, "  ❌ {}", path.display())?;
            }
        }
        writeln!(w)?;
        Ok(self.report.passed())
    }

    fn run_build<W: Write>(&mut self, w: &mut W) -> io::Result<bool> {
        let command_line = self.config.build_command_line();
        writeln!(w, "🔨 Running the build...")?;
        writeln!(w, "  Command: {}\n", command_line)?;
        tracing::info!(command = %command_line, "running build");

        let result = process::run(
            &self.config.build_program,
            &self.config.build_args,
            &self.config.project_root,
            self.config.build_timeout,
        );
        match result {
            Ok(output) => self.report_build_result(w, &output),
            Err(process::Error::NotFound(program)) => {
                self.report.error(format!(
                    "build command `{}` not found; make sure it is installed",
                    program
                ));
                writeln!(w, "❌ Command `{}` not found\n", program)?;
                writeln!(w, "Hint: {}\n", self.config.build_install_hint)?;
                Ok(false)
            }
            Err(process::Error::TimedOut(timeout)) => {
                self.report.error(format!(
                    "build timed out after {} seconds",
                    timeout.as_secs()
                ));
                writeln!(w, "❌ Build timed out\n")?;
                Ok(false)
            }
            Err(process::Error::Io(err)) => {
                self.report.error(format!("build process error: {}", err));
                writeln!(w, "❌ Build error: {}\n", err)?;
                Ok(false)
            }
        }
    }

    fn report_build_result<W: Write>(&mut self, w: &mut W, output: &Output) -> io::Result<bool> {
        if !output.stdout.trim().is_empty() {
            writeln!(w, "📄 Build output:")?;
            for line in output.stdout_tail(self.config.build_output_tail) {
                writeln!(w, "  {}", line)?;
            }
            writeln!(w)?;
        }

        if output.status.success() {
            writeln!(
                w,
                "✅ Build succeeded (took {:.1}s)\n",
                output.elapsed.as_secs_f64()
            )?;
            return Ok(true);
        }

        match output.status.code() {
            Some(code) => {
                self.report
                    .error(format!("build failed (exit code {})", code));
                writeln!(w, "❌ Build failed (exit code {})", code)?;
            }
            None => {
                self.report.error("build was terminated by a signal");
                writeln!(w, "❌ Build was terminated by a signal")?;
            }
        }
        if !output.stderr.trim().is_empty() {
            writeln!(w, "\nError output:")?;
            writeln!(w, "{}", output.stderr.trim_end())?;
        }
        writeln!(w)?;
        Ok(false)
    }

    /// Checks the output directory. Only a missing directory is an error;
    /// missing expected files are warnings.
    fn check_output<W: Write>(&mut self, w: &mut W) -> io::Result<bool> {
        writeln!(w, "📦 Checking build output...")?;
        let output_directory = self.config.resolve(&self.config.output_directory);
        let name = self.config.output_directory.display();

        if !output_directory.is_dir() {
            self.report
                .error(format!("build output directory {}/ does not exist", name));
            writeln!(w, "  ❌ {}/ does not exist\n", name)?;
            return Ok(false);
        }

        for file in &self.config.expected_outputs {
            match std::fs::metadata(output_directory.join(file)) {
                Ok(metadata) if metadata.is_file() => writeln!(
                    w,
                    "  ✅ {} ({} bytes)",
                    file.display(),
                    group_digits(metadata.len())
                )?,
                _ => {
                    self.report.warn(format!(
                        "build output is missing file: {}",
                        file.display()
                    ));
                    writeln!(w, "  ⚠️  {} (missing)", file.display())?;
                }
            }
        }

        let stats = scan_output(&output_directory, &mut self.report);
        writeln!(w, "\n  📊 Build statistics:")?;
        writeln!(w, "     Files: {}", stats.files)?;
        writeln!(w, "     Total size: {}", megabytes(stats.bytes))?;
        writeln!(w)?;
        Ok(true)
    }

    /// Writes the final pass/fail summary.
    pub fn print_summary<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_rule(w)?;
        if !self.report.passed() {
            writeln!(w, "❌ Validation failed\n")?;
        }
        self.report.write_errors(w, "Errors:")?;
        self.report.write_warnings(w, "⚠️  Warnings:")?;
        if self.report.is_clean() {
            writeln!(w, "✅ All checks passed!")?;
        } else if self.report.passed() {
            writeln!(w, "✅ Validation passed (with warnings)")?;
        }
        write_rule(w)
    }
}

/// Counts the regular files under `dir` and their total size, following
/// symlinks. Entries that can't be read are recorded as warnings and skipped.
pub fn scan_output(dir: &Path, report: &mut Report) -> OutputStats {
    let mut stats = OutputStats::default();
    for result in WalkDir::new(dir).follow_links(true) {
        let metadata = match result.and_then(|entry| entry.metadata()) {
            Ok(metadata) => metadata,
            Err(err) => {
                report.warn(format!("could not read build output entry: {}", err));
                continue;
            }
        };
        if metadata.is_file() {
            stats.files += 1;
            stats.bytes += metadata.len();
        }
    }
    tracing::debug!(files = stats.files, bytes = stats.bytes, "scanned build output");
    stats
}
