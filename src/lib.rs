//! The library code behind the `validate-post` and `build-check` tools. Both
//! tools follow the same shape:
//!
//! 1. Run a fixed sequence of checks, recording every problem found in a
//!    [`crate::report::Report`] instead of stopping at the first one
//! 2. Print a human-readable report
//! 3. Exit non-zero iff the report holds at least one error
//!
//! Post validation ([`crate::post`]) parses the frontmatter header of a
//! Markdown post ([`crate::frontmatter`]) into loosely typed values
//! ([`crate::value`]) and lints them along with the post body. Build
//! validation ([`crate::build`]) checks the project layout, runs the site
//! build with a hard timeout ([`crate::process`]), and inspects the output
//! directory.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod frontmatter;
pub mod post;
pub mod process;
pub mod report;
pub mod util;
pub mod value;

use tracing_subscriber::EnvFilter;

/// Installs the stderr log subscriber for the binaries. `RUST_LOG` wins over
/// `default_directive` when it's set.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
