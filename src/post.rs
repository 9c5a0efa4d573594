//! Exports [`PostValidator`], which lints a single Markdown post: its
//! frontmatter fields ([`crate::frontmatter`]), its headings, and where it
//! lives on disk.

use crate::config::Config;
use crate::frontmatter::{self, Metadata};
use crate::report::{write_rule, Report};
use crate::util::{display_parent, normalize};
use crate::value::Value;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Fields every post must fill in.
pub const REQUIRED_FIELDS: &[&str] = &["title", "published"];

/// Fields holding `YYYY-MM-DD` dates.
pub const DATE_FIELDS: &[&str] = &["published", "updated"];

static DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap());

static ABBRLINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").unwrap());

/// Validates one post file and accumulates the findings.
pub struct PostValidator<'a> {
    /// The post's path as given on the command line.
    pub path: PathBuf,

    config: &'a Config,

    /// The parsed frontmatter. Empty until a successful parse.
    pub metadata: Metadata,

    /// The text after the closing frontmatter fence.
    pub body: String,

    pub report: Report,
}

impl<'a> PostValidator<'a> {
    pub fn new<P: Into<PathBuf>>(path: P, config: &'a Config) -> PostValidator<'a> {
        PostValidator {
            path: path.into(),
            config,
            metadata: Metadata::new(),
            body: String::new(),
            report: Report::new(),
        }
    }

    /// Reads the post from disk and validates it. Returns `true` iff no
    /// errors were recorded.
    pub fn validate(&mut self) -> bool {
        if !self.path.exists() {
            self.report
                .error(format!("file does not exist: {}", self.path.display()));
            return false;
        }

        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                self.report.error(format!("failed to read file: {}", e));
                return false;
            }
        };
        tracing::debug!(path = %self.path.display(), bytes = contents.len(), "read post");
        self.validate_source(&contents)
    }

    /// Validates already-loaded post source. A missing or malformed
    /// frontmatter block is the only finding that stops the other checks;
    /// every other rule runs regardless of how the earlier ones went.
    pub fn validate_source(&mut self, contents: &str) -> bool {
        match frontmatter::parse(contents) {
            Ok(doc) => {
                self.metadata = doc.metadata;
                self.body = doc.body.to_owned();
            }
            Err(e) => {
                self.report.error(e.to_string());
                return false;
            }
        }

        self.check_required_fields();
        self.check_dates();
        self.check_tags();
        self.check_abbrlink();
        self.check_draft();
        self.check_h1();
        self.check_location();

        self.report.passed()
    }

    fn check_required_fields(&mut self) {
        for field in REQUIRED_FIELDS {
            match self.metadata.get(field) {
                None => self
                    .report
                    .error(format!("missing required field: {}", field)),
                Some(value) if value.is_empty() => self
                    .report
                    .error(format!("required field must not be empty: {}", field)),
                Some(_) => {}
            }
        }
    }

    fn check_dates(&mut self) {
        for field in DATE_FIELDS {
            let date = match self.metadata.get(field) {
                Some(value) => value.to_string(),
                None => continue,
            };
            if !DATE.is_match(&date) {
                self.report.error(format!(
                    "{} has a malformed date: '{}' (expected YYYY-MM-DD)",
                    field, date
                ));
            } else if !is_calendar_date(&date) {
                self.report
                    .error(format!("{} is not a valid date: {}", field, date));
            }
        }
    }

    fn check_tags(&mut self) {
        let tags = match self.metadata.get("tags") {
            Some(tags) => tags,
            None => return,
        };
        match tags.as_list() {
            None => self.report.error(format!(
                "tags must be a list like [tag1, tag2], got: {}",
                tags
            )),
            Some([]) => self
                .report
                .warn("tags is empty; consider adding 3-5 tags"),
            Some(items) if items.len() > self.config.max_tags => self.report.warn(format!(
                "too many tags ({}); 3-5 is recommended",
                items.len()
            )),
            Some(_) => {}
        }
    }

    fn check_abbrlink(&mut self) {
        let abbrlink = match self.metadata.get("abbrlink") {
            Some(value) => value.to_string(),
            None => return,
        };
        if ABBRLINK.is_match(&abbrlink) {
            return;
        }
        if abbrlink.is_empty() {
            self.report.error("abbrlink must not be empty");
            return;
        }

        let mut disallowed: Vec<char> = Vec::new();
        for c in abbrlink.chars() {
            if !is_slug_char(c) && !disallowed.contains(&c) {
                disallowed.push(c);
            }
        }
        let cited = disallowed
            .iter()
            .map(|c| format!("`{}`", c))
            .collect::<Vec<_>>()
            .join(", ");
        let mut message = format!(
            "abbrlink '{}' contains disallowed characters {} \
             (only lowercase letters, digits and hyphens are allowed)",
            abbrlink, cited
        );
        let suggestion = slug::slugify(&abbrlink);
        if !suggestion.is_empty() {
            message.push_str(&format!("; try '{}'", suggestion));
        }
        self.report.error(message);
    }

    fn check_draft(&mut self) {
        if let Some(Value::Boolean(true)) = self.metadata.get("draft") {
            self.report
                .warn("post is a draft (draft: true) and will not be published");
        }
    }

    fn check_h1(&mut self) {
        match count_h1(&self.body) {
            0 => self.report.error("missing H1 heading (# Title)"),
            1 => {}
            n => self.report.error(format!(
                "multiple H1 headings ({} found), expected exactly one",
                n
            )),
        }
    }

    fn check_location(&mut self) {
        let path = normalize(&self.path);
        let root = normalize(&self.config.project_root);
        let path = if path.is_absolute() {
            path.strip_prefix(&root).map(Path::to_owned).unwrap_or(path)
        } else {
            path
        };
        let posts_directory = normalize(&self.config.posts_directory);
        if !path.starts_with(&posts_directory) {
            self.report.warn(format!(
                "file is not in the recommended directory {}/; it is in: {}",
                posts_directory.display(),
                display_parent(&self.path)
            ));
        }
    }

    /// Writes the report for this post: metadata, errors, warnings, and a
    /// final status line. Returns `true` iff the post passed.
    pub fn print_report<W: Write>(&self, w: &mut W) -> io::Result<bool> {
        writeln!(w)?;
        write_rule(w)?;
        writeln!(w, "Validating: {}", self.path.display())?;
        write_rule(w)?;
        writeln!(w)?;

        if !self.metadata.is_empty() {
            writeln!(w, "📋 Metadata:")?;
            for (key, value) in self.metadata.iter() {
                writeln!(w, "  • {}: {}", key, value)?;
            }
            writeln!(w)?;
        }

        self.report.write_errors(w, "❌ Errors:")?;
        self.report.write_warnings(w, "⚠️  Warnings:")?;

        if self.report.is_clean() {
            writeln!(w, "✅ Passed! The post follows every rule.\n")?;
        } else if self.report.passed() {
            writeln!(w, "✅ Passed (with warnings)\n")?;
        } else {
            writeln!(
                w,
                "❌ Failed: {} error(s) found\n",
                self.report.errors.len()
            )?;
        }
        Ok(self.report.passed())
    }

    /// Writes the extra detail shown in verbose mode: the metadata as a YAML
    /// document and the size of the body.
    pub fn print_details<W: Write>(&self, w: &mut W) -> io::Result<()> {
        if !self.metadata.is_empty() {
            let yaml = serde_yaml::to_string(&self.metadata)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            writeln!(w, "🔎 Parsed frontmatter:")?;
            for line in yaml.lines() {
                writeln!(w, "  {}", line)?;
            }
        }
        writeln!(w, "🔎 Body: {} line(s)\n", self.body.lines().count())
    }
}

/// Year 0 parses but isn't a date a post can carry; years start at 1.
fn is_calendar_date(date: &str) -> bool {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(date) => date.year() >= 1,
        Err(_) => false,
    }
}

fn is_slug_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'
}

/// Counts level-1 headings: lines starting with `# ` whose next character
/// exists and isn't another `#`.
pub fn count_h1(body: &str) -> usize {
    body.lines()
        .filter(|line| match line.strip_prefix("# ").and_then(|rest| rest.chars().next()) {
            Some(c) => c != '#',
            None => false,
        })
        .count()
}

#[cfg(test)]
mod test {
    use super::*;

    const POSTS: &str = "src/content/posts/hello.md";

    fn check(path: &str, contents: &str) -> Report {
        let config = Config::default();
        let mut validator = PostValidator::new(path, &config);
        validator.validate_source(contents);
        validator.report
    }

    fn post(header: &str, body: &str) -> String {
        format!("---\n{}\n---\n{}", header, body)
    }

    const OK_HEADER: &str = "title: Hello World\npublished: 2024-01-15";

    #[test]
    fn test_clean_post() {
        let report = check(
            POSTS,
            &post(
                "title: Hello World\npublished: 2024-01-15\ntags: [intro, test]",
                "# Hello World\nSome text.\n",
            ),
        );
        assert_eq!(report, Report::new());
    }

    #[test]
    fn test_no_frontmatter_stops_everything() {
        let report = check("elsewhere/post.md", "# Hello\nno header here\n");
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("no valid frontmatter found"));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_required_fields() {
        let report = check(POSTS, &post("title: \"\"\nauthor: me", "# T\n"));
        assert_eq!(
            report.errors,
            vec![
                "required field must not be empty: title".to_owned(),
                "missing required field: published".to_owned(),
            ]
        );
    }

    #[test]
    fn test_malformed_dates() {
        let report = check(
            POSTS,
            &post(
                "title: T\npublished: 2024/01/15\nupdated: 15-01-2024",
                "# T\n",
            ),
        );
        assert_eq!(
            report.errors,
            vec![
                "published has a malformed date: '2024/01/15' (expected YYYY-MM-DD)".to_owned(),
                "updated has a malformed date: '15-01-2024' (expected YYYY-MM-DD)".to_owned(),
            ]
        );
    }

    #[test]
    fn test_impossible_dates() {
        let report = check(
            POSTS,
            &post("title: T\npublished: 2023-02-29\nupdated: 2024-13-01", "# T\n"),
        );
        assert_eq!(
            report.errors,
            vec![
                "published is not a valid date: 2023-02-29".to_owned(),
                "updated is not a valid date: 2024-13-01".to_owned(),
            ]
        );
        let report = check(POSTS, &post("title: T\npublished: 0000-01-15", "# T\n"));
        assert_eq!(
            report.errors,
            vec!["published is not a valid date: 0000-01-15".to_owned()]
        );

        // Leap day is fine.
        let report = check(POSTS, &post("title: T\npublished: 2024-02-29", "# T\n"));
        assert!(report.passed());
    }

    #[test]
    fn test_integer_date_is_malformed() {
        let report = check(POSTS, &post("title: T\npublished: 20240115", "# T\n"));
        assert_eq!(
            report.errors,
            vec!["published has a malformed date: '20240115' (expected YYYY-MM-DD)".to_owned()]
        );
    }

    #[test]
    fn test_tags_not_a_list() {
        let report = check(POSTS, &post(&format!("{}\ntags: rust", OK_HEADER), "# T\n"));
        assert_eq!(
            report.errors,
            vec!["tags must be a list like [tag1, tag2], got: rust".to_owned()]
        );
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_tag_count_warnings() {
        let report = check(POSTS, &post(&format!("{}\ntags: []", OK_HEADER), "# T\n"));
        assert!(report.passed());
        assert_eq!(
            report.warnings,
            vec!["tags is empty; consider adding 3-5 tags".to_owned()]
        );

        let report = check(
            POSTS,
            &post(
                &format!("{}\ntags: [a, b, c, d, e, f, g, h, i, j, k]", OK_HEADER),
                "# T\n",
            ),
        );
        assert!(report.passed());
        assert_eq!(
            report.warnings,
            vec!["too many tags (11); 3-5 is recommended".to_owned()]
        );

        let report = check(
            POSTS,
            &post(
                &format!("{}\ntags: [a, b, c, d, e, f, g, h, i, j]", OK_HEADER),
                "# T\n",
            ),
        );
        assert!(report.is_clean());
    }

    #[test]
    fn test_abbrlink() {
        let report = check(
            POSTS,
            &post(&format!("{}\nabbrlink: Hello_World", OK_HEADER), "# T\n"),
        );
        assert_eq!(report.errors.len(), 1);
        let error = &report.errors[0];
        assert!(error.contains("`H`, `_`, `W`"), "{}", error);
        assert!(error.contains("try 'hello-world'"), "{}", error);

        let report = check(
            POSTS,
            &post(&format!("{}\nabbrlink: my-post-2024", OK_HEADER), "# T\n"),
        );
        assert!(report.is_clean());

        // Digits alone are parsed as an integer and still pass.
        let report = check(POSTS, &post(&format!("{}\nabbrlink: 42", OK_HEADER), "# T\n"));
        assert!(report.is_clean());

        let report = check(POSTS, &post(&format!("{}\nabbrlink:", OK_HEADER), "# T\n"));
        assert_eq!(report.errors, vec!["abbrlink must not be empty".to_owned()]);
    }

    #[test]
    fn test_draft() {
        let report = check(POSTS, &post(&format!("{}\ndraft: True", OK_HEADER), "# T\n"));
        assert!(report.passed());
        assert_eq!(report.warnings.len(), 1);

        let report = check(POSTS, &post(&format!("{}\ndraft: false", OK_HEADER), "# T\n"));
        assert!(report.is_clean());

        // Only a real boolean counts.
        let report = check(POSTS, &post(&format!("{}\ndraft: 'true'", OK_HEADER), "# T\n"));
        assert!(report.is_clean());
    }

    #[test]
    fn test_count_h1() {
        assert_eq!(count_h1("no headings\n## Sub\n"), 0);
        assert_eq!(count_h1("# One\n## Two\n### Three\n"), 1);
        assert_eq!(count_h1("# A\ntext\n# B\n# C\n"), 3);
        assert_eq!(count_h1("#NoSpace\n# \n#\n # Indented\n"), 0);
        assert_eq!(count_h1("# #hashtag title\n"), 0);
    }

    #[test]
    fn test_heading_errors() {
        let report = check(POSTS, &post(OK_HEADER, "Just text.\n## Section\n"));
        assert_eq!(report.errors, vec!["missing H1 heading (# Title)".to_owned()]);

        let report = check(POSTS, &post(OK_HEADER, "# A\n# B\n# C\n"));
        assert_eq!(
            report.errors,
            vec!["multiple H1 headings (3 found), expected exactly one".to_owned()]
        );
    }

    #[test]
    fn test_location() {
        let body = "# T\n";
        assert!(check("./src/content/posts/a.md", &post(OK_HEADER, body)).is_clean());
        assert!(check("src/content/posts/2024/a.md", &post(OK_HEADER, body)).is_clean());

        let report = check("drafts/a.md", &post(OK_HEADER, body));
        assert!(report.passed());
        assert_eq!(
            report.warnings,
            vec![
                "file is not in the recommended directory src/content/posts/; it is in: drafts"
                    .to_owned()
            ]
        );

        let report = check("a.md", &post(OK_HEADER, body));
        assert!(report.warnings[0].ends_with("it is in: ."));
    }

    #[test]
    fn test_absolute_path_under_project_root() {
        let config = Config::with_root(PathBuf::from("/srv/blog"));
        let mut validator = PostValidator::new("/srv/blog/src/content/posts/a.md", &config);
        validator.validate_source(&post(OK_HEADER, "# T\n"));
        assert!(validator.report.is_clean());
    }

    #[test]
    fn test_all_rules_run() {
        let report = check(
            "a.md",
            &post("published: 2024-1-5\ntags: x\nabbrlink: A\ndraft: true", "text\n"),
        );
        assert_eq!(report.errors.len(), 5);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_print_report() -> io::Result<()> {
        let config = Config::default();
        let mut validator = PostValidator::new(POSTS, &config);
        validator.validate_source(&post(
            "title: Hi\npublished: 2024-01-15\ntags: [a, b]",
            "# Hi\n",
        ));
        let mut out = Vec::new();
        assert!(validator.print_report(&mut out)?);
        let out = String::from_utf8_lossy(&out);
        assert!(out.contains("Validating: src/content/posts/hello.md"));
        assert!(out.contains("  • tags: [a, b]"));
        assert!(out.contains("Passed! The post follows every rule."));
        Ok(())
    }

    #[test]
    fn test_print_details() -> io::Result<()> {
        let config = Config::default();
        let mut validator = PostValidator::new(POSTS, &config);
        validator.validate_source(&post("title: Hi\ndraft: true", "# Hi\nline\n"));
        let mut out = Vec::new();
        validator.print_details(&mut out)?;
        let out = String::from_utf8_lossy(&out);
        assert!(out.contains("title: Hi"), "{}", out);
        assert!(out.contains("draft: true"), "{}", out);
        assert!(out.contains("Body: 2 line(s)"), "{}", out);
        Ok(())
    }
}
