use std::path::{Component, Path, PathBuf};

/// Formats `n` with commas between groups of three digits (`1,234,567`).
pub fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats a byte count in mebibytes with two decimals.
pub fn megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

/// Drops `.` components so `./a/b` and `a/b` compare equal.
pub fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Returns the path's parent directory for display, `.` when it has none.
pub fn display_parent(path: &Path) -> String {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.display().to_string(),
        _ => ".".to_owned(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_group_digits() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1,000");
        assert_eq!(group_digits(1234567), "1,234,567");
    }

    #[test]
    fn test_megabytes() {
        assert_eq!(megabytes(0), "0.00 MB");
        assert_eq!(megabytes(3 * 1024 * 1024 / 2), "1.50 MB");
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("./a/./b.md")), PathBuf::from("a/b.md"));
    }

    #[test]
    fn test_display_parent() {
        assert_eq!(display_parent(Path::new("post.md")), ".");
        assert_eq!(display_parent(Path::new("drafts/post.md")), "drafts");
    }
}
