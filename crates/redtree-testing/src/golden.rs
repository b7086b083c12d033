//! Golden file testing
//!
//! Compares generated text (design summaries, JSON dumps) against files
//! stored under `tests/golden/` at the workspace root. On mismatch the test
//! fails with a line diff.
//!
//! Refresh golden files after an intentional change with:
//! ```bash
//! REDTREE_UPDATE_GOLDEN=1 cargo test
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const UPDATE_VAR: &str = "REDTREE_UPDATE_GOLDEN";

/// A golden file test case
pub struct GoldenTest {
    /// Name of the test (used for golden file naming)
    name: String,

    /// Directory containing golden files
    golden_dir: PathBuf,

    /// Whether to update golden files instead of comparing
    update_mode: bool,
}

impl GoldenTest {
    /// Create a golden test reading from `<workspace>/tests/golden`
    pub fn new(name: &str) -> Self {
        Self::with_golden_dir(name, workspace_root().join("tests").join("golden"))
    }

    /// Create a golden test with a custom golden directory
    pub fn with_golden_dir(name: &str, golden_dir: impl Into<PathBuf>) -> Self {
        let update_mode = env::var(UPDATE_VAR)
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        Self {
            name: name.to_string(),
            golden_dir: golden_dir.into(),
            update_mode,
        }
    }

    /// Assert that `actual` matches `{golden_dir}/{name}.{extension}`
    ///
    /// # Panics
    ///
    /// Panics on mismatch, or if the golden file can't be read or written.
    pub fn assert_eq(&self, extension: &str, actual: &str) {
        let golden_path = self.golden_path(extension);

        if self.update_mode {
            self.update_golden(&golden_path, actual);
        } else {
            self.compare_golden(&golden_path, actual);
        }
    }

    fn golden_path(&self, extension: &str) -> PathBuf {
        self.golden_dir.join(format!("{}.{}", self.name, extension))
    }

    fn update_golden(&self, path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create golden directory {:?}: {}", parent, e)
            });
        }
        fs::write(path, content)
            .unwrap_or_else(|e| panic!("Failed to write golden file {:?}: {}", path, e));
    }

    fn compare_golden(&self, path: &Path, actual: &str) {
        let expected = fs::read_to_string(path).unwrap_or_else(|e| {
            panic!(
                "Failed to read golden file {:?}: {}\n\
                 Hint: run with {}=1 to create it",
                path, e, UPDATE_VAR
            )
        });

        if expected != actual {
            panic!(
                "Golden file mismatch for '{}' ({})\n\n{}\n\
                 To accept the new output: {}=1 cargo test {}",
                self.name,
                path.display(),
                line_diff(&expected, actual),
                UPDATE_VAR,
                self.name
            );
        }
    }
}

/// Line-by-line diff, capped at the first ten differing lines
pub fn line_diff(expected: &str, actual: &str) -> String {
    let expected_lines: Vec<&str> = expected.lines().collect();
    let actual_lines: Vec<&str> = actual.lines().collect();

    let mut diff = String::from("Differences:\n");
    let mut diff_count = 0;

    for i in 0..expected_lines.len().max(actual_lines.len()) {
        let exp_line = expected_lines.get(i).copied().unwrap_or("");
        let act_line = actual_lines.get(i).copied().unwrap_or("");

        if exp_line != act_line {
            diff_count += 1;
            if diff_count <= 10 {
                diff.push_str(&format!(
                    "Line {}:\n  Expected: {}\n  Actual:   {}\n",
                    i + 1,
                    exp_line,
                    act_line
                ));
            }
        }
    }

    if diff_count > 10 {
        diff.push_str(&format!("... and {} more differences\n", diff_count - 10));
    }
    diff.push_str(&format!(
        "Total lines: expected={}, actual={}; different: {}\n",
        expected_lines.len(),
        actual_lines.len(),
        diff_count
    ));
    diff
}

/// Nearest ancestor of this crate whose Cargo.toml declares `[workspace]`
fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .find(|dir| {
            fs::read_to_string(dir.join("Cargo.toml"))
                .map(|contents| contents.contains("[workspace]"))
                .unwrap_or(false)
        })
        .map(Path::to_path_buf)
        .unwrap_or(manifest_dir)
}

/// Declare a golden file test
///
/// ```rust,ignore
/// golden_test!(add_tree_summary, "add_tree", "txt", {
///     render_summary(&tree.elaborate().unwrap())
/// });
/// ```
#[macro_export]
macro_rules! golden_test {
    ($test_name:ident, $golden_name:expr, $extension:expr, $body:block) => {
        #[test]
        fn $test_name() {
            let test = $crate::golden::GoldenTest::new($golden_name);
            let actual: String = $body;
            test.assert_eq($extension, &actual);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_golden_path_generation() {
        let test = GoldenTest::new("example");
        let path = test.golden_path("txt");
        assert!(path.ends_with("tests/golden/example.txt"));
    }

    #[test]
    fn test_line_diff_reports_changed_line() {
        let diff = line_diff("a\nb\nc", "a\nx\nc");
        assert!(diff.contains("Line 2:"));
        assert!(diff.contains("different: 1"));
    }
}
