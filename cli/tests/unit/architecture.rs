//! Structural tests for layer boundary enforcement.
//!
//! These tests scan source files to verify that domain, application and
//! infra keep to their side of the hexagonal boundaries.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Tracks whether the current line sits inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    fn process_line(&mut self, line: &str) -> bool {
        if line.trim().contains("#[cfg(test)]") {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

/// Non-comment lines outside `#[cfg(test)]`, paired with 1-based line numbers.
fn production_lines(path: &Path) -> Vec<(usize, String)> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    let mut tracker = CfgTestTracker::new();
    content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let in_test = tracker.process_line(line);
            let trimmed = line.trim();
            let comment = trimmed.starts_with("//")
                || trimmed.starts_with("/*")
                || trimmed.starts_with('*');
            (!in_test && !comment).then(|| (i + 1, line.to_string()))
        })
        .collect()
}

fn src_dir(parts: &[&str]) -> PathBuf {
    parts
        .iter()
        .fold(Path::new(env!("CARGO_MANIFEST_DIR")).join("src"), |p, part| p.join(part))
}

fn rel(file: &Path) -> String {
    file.strip_prefix(env!("CARGO_MANIFEST_DIR"))
        .unwrap_or(file)
        .display()
        .to_string()
}

/// Every production line in `dir` containing one of `needles`.
fn find_violations(dir: &Path, needles: &[&str]) -> Vec<String> {
    let mut violations = Vec::new();
    for file in collect_rs_files(dir) {
        for (lineno, line) in production_lines(&file) {
            for needle in needles {
                if line.contains(needle) {
                    violations.push(format!("{}:{lineno}: `{needle}`: {line}", rel(&file)));
                }
            }
        }
    }
    violations
}

// ── Layer imports ─────────────────────────────────────────────────────────────

#[test]
fn domain_is_free_of_io_and_outer_layers() {
    let violations = find_violations(
        &src_dir(&["domain"]),
        &[
            "crate::infra",
            "crate::application",
            "crate::commands",
            "crate::output",
            "tokio::",
            "std::fs",
            "std::process",
            "std::net",
        ],
    );
    assert!(
        violations.is_empty(),
        "domain/ must stay pure:\n{}",
        violations.join("\n")
    );
}

#[test]
fn application_never_imports_infra_or_presentation() {
    let violations = find_violations(
        &src_dir(&["application"]),
        &["crate::infra", "crate::commands", "crate::output", "std::fs::", "std::process::Command"],
    );
    assert!(
        violations.is_empty(),
        "application/ must route I/O through ports:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_has_no_imports_from_commands_or_output() {
    let violations = find_violations(&src_dir(&["infra"]), &["crate::commands", "crate::output"]);
    assert!(
        violations.is_empty(),
        "infra/ must not import from commands/ or output/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_has_no_print_macros_outside_tests() {
    let violations = find_violations(&src_dir(&["infra"]), &["println!", "eprintln!"]);
    assert!(
        violations.is_empty(),
        "infra/ must not use println!/eprintln! outside #[cfg(test)]:\n{}",
        violations.join("\n")
    );
}

// ── Construction of adapters ──────────────────────────────────────────────────

#[test]
fn adapters_are_constructed_only_in_app_context() {
    let mut violations = Vec::new();
    for file in collect_rs_files(&src_dir(&[])) {
        let path = rel(&file).replace('\\', "/");
        if path.contains("/infra/") || path.ends_with("app.rs") {
            continue;
        }
        for (lineno, line) in production_lines(&file) {
            for ctor in ["TokioCommandRunner::new", "DockerCompose::new", "UreqDownloader::new"] {
                if line.contains(ctor) {
                    violations.push(format!("{path}:{lineno}: {line}"));
                }
            }
        }
    }
    assert!(
        violations.is_empty(),
        "adapters must be built in AppContext, not in commands or services:\n{}",
        violations.join("\n")
    );
}

#[test]
fn services_take_trait_bounds_not_adapters() {
    let concrete = [
        "DockerCompose<",
        "JsonSiteRegistry",
        "UreqDownloader",
        "LocalToolFs",
        "FsLocks",
    ];
    let mut violations = Vec::new();
    for file in collect_rs_files(&src_dir(&["application", "services"])) {
        for (lineno, line) in production_lines(&file) {
            if !line.contains("fn ") {
                continue;
            }
            for ty in &concrete {
                if line.contains(ty) {
                    violations.push(format!("{}:{lineno}: `{ty}`: {line}", rel(&file)));
                }
            }
        }
    }
    assert!(
        violations.is_empty(),
        "service signatures must use port traits:\n{}",
        violations.join("\n")
    );
}

// ── Output routing ────────────────────────────────────────────────────────────

#[test]
fn no_inline_json_branching_in_commands() {
    let violations = find_violations(
        &src_dir(&["commands"]),
        &["json: bool", "if json", "if !json"],
    );
    assert!(
        violations.is_empty(),
        "commands/ must branch on app.is_json() instead of json flags:\n{}",
        violations.join("\n")
    );
}
