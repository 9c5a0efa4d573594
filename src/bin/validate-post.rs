use anyhow::Result;
use blogcheck::config::Config;
use blogcheck::post::PostValidator;
use blogcheck::report::write_rule;
use clap::{App, Arg};
use std::io::{self, Write};

const AFTER_HELP: &str = "EXAMPLES:
    validate-post src/content/posts/my-article.md
    validate-post src/content/posts/*.md

CHECKS:
    required fields (title, published)
    date format (YYYY-MM-DD)
    tags format (a list)
    abbrlink format (lowercase letters, digits, hyphens)
    exactly one H1 heading
    file location (src/content/posts/)

ENVIRONMENT:
    RUST_LOG=debug    Enable debug logging";

fn main() -> Result<()> {
    let matches = App::new("validate-post")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Validates the frontmatter and structure of blog posts")
        .after_help(AFTER_HELP)
        .arg(
            Arg::with_name("files")
                .value_name("FILE")
                .help("Markdown post files to validate")
                .multiple(true)
                .required(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Show the parsed frontmatter and debug logs"),
        )
        .get_matches();

    let verbose = matches.is_present("verbose");
    blogcheck::init_tracing(if verbose { "debug" } else { "warn" });

    let files: Vec<&str> = matches
        .values_of("files")
        .map(|values| values.collect())
        .unwrap_or_default();
    let config = Config::from_current_dir()?;

    let stdout = io::stdout();
    let mut w = stdout.lock();
    let total = files.len();
    let mut all_passed = true;
    for (i, file) in files.iter().enumerate() {
        if total > 1 {
            write!(w, "\n[{}/{}] ", i + 1, total)?;
        }
        let mut validator = PostValidator::new(*file, &config);
        let passed = validator.validate();
        validator.print_report(&mut w)?;
        if verbose {
            validator.print_details(&mut w)?;
        }
        tracing::info!(file, passed, "validated post");
        all_passed &= passed;
    }

    if total > 1 {
        writeln!(w)?;
        write_rule(&mut w)?;
        if all_passed {
            writeln!(w, "✅ All files passed ({})", total)?;
        } else {
            writeln!(w, "❌ Some files failed validation")?;
        }
        write_rule(&mut w)?;
        writeln!(w)?;
    }
    w.flush()?;

    std::process::exit(if all_passed { 0 } else { 1 });
}
