//! Defines [`Config`], the fixed settings both tools run against. Neither tool
//! reads a configuration file; the defaults describe the blog's project
//! layout and build command.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where posts are expected to live, relative to the project root.
pub const POSTS_DIRECTORY: &str = "src/content/posts";

pub struct Config {
    /// The project root. Every other relative path is resolved against it.
    pub project_root: PathBuf,

    /// Paths that must exist for the directory to be a blog project.
    pub required_paths: Vec<PathBuf>,

    /// The canonical location of post source files.
    pub posts_directory: PathBuf,

    /// The build command's program name.
    pub build_program: String,

    /// The build command's arguments.
    pub build_args: Vec<String>,

    /// Printed when `build_program` can't be found.
    pub build_install_hint: String,

    /// How long the build may run before it's killed.
    pub build_timeout: Duration,

    /// How many trailing lines of build stdout to echo.
    pub build_output_tail: usize,

    /// The build output directory.
    pub output_directory: PathBuf,

    /// Files the build is expected to produce, relative to
    /// `output_directory`. Missing ones are warnings, not errors.
    pub expected_outputs: Vec<PathBuf>,

    /// Above this many tags a post gets a warning.
    pub max_tags: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config::with_root(PathBuf::from("."))
    }
}

impl Config {
    /// Builds the default configuration rooted at `project_root`.
    pub fn with_root(project_root: PathBuf) -> Config {
        Config {
            project_root,
            required_paths: vec![
                PathBuf::from("package.json"),
                PathBuf::from("astro.config.mjs"),
                PathBuf::from(POSTS_DIRECTORY),
            ],
            posts_directory: PathBuf::from(POSTS_DIRECTORY),
            build_program: "pnpm".to_owned(),
            build_args: vec!["run".to_owned(), "build".to_owned()],
            build_install_hint: "run `npm install -g pnpm` to install pnpm".to_owned(),
            build_timeout: Duration::from_secs(300),
            build_output_tail: 20,
            output_directory: PathBuf::from("dist"),
            expected_outputs: vec![PathBuf::from("index.html")],
            max_tags: 10,
        }
    }

    /// Builds the default configuration rooted at the process's working
    /// directory.
    pub fn from_current_dir() -> Result<Config> {
        match std::env::current_dir() {
            Ok(dir) => Ok(Config::with_root(dir)),
            Err(e) => Err(anyhow!("Resolving the working directory: {}", e)),
        }
    }

    /// Resolves `path` against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.project_root.join(path)
    }

    /// The build command as it would be typed into a shell.
    pub fn build_command_line(&self) -> String {
        std::iter::once(self.build_program.as_str())
            .chain(self.build_args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
