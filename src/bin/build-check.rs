use anyhow::Result;
use blogcheck::build::BuildValidator;
use blogcheck::config::Config;
use clap::{App, Arg};
use std::io::{self, Write};

const AFTER_HELP: &str = "EXAMPLES:
    build-check                 Run the build, then check its output
    build-check --skip-build    Only check an existing build's output

CHECKS:
    project structure
    build command succeeds (pnpm run build, 5 minute timeout)
    build output files exist
    build output statistics";

fn main() -> Result<()> {
    let matches = App::new("build-check")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds the blog and checks the build output")
        .after_help(AFTER_HELP)
        .arg(
            Arg::with_name("skip-build")
                .long("skip-build")
                .help("Skip the build step and only check the existing build output"),
        )
        .get_matches();

    blogcheck::init_tracing("warn");

    let config = Config::from_current_dir()?;
    let mut validator = BuildValidator::new(config, matches.is_present("skip-build"));

    let stdout = io::stdout();
    let mut w = stdout.lock();
    let passed = validator.validate(&mut w)?;
    validator.print_summary(&mut w)?;
    w.flush()?;
    tracing::info!(passed, "build check finished");

    std::process::exit(if passed { 0 } else { 1 });
}
