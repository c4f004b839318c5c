//! Output formatting - plaintext and JSON.

use serde::Serialize;
use serde_json::json;

use crate::model::{AnalysisResult, CodeIssue, WorkspaceResult};

/// Finding counts per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub files: usize,
    pub imports: usize,
    pub variables: usize,
    pub parameters: usize,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.imports + self.variables + self.parameters
    }
}

/// Count findings across a workspace result.
pub fn summarize(results: &WorkspaceResult) -> Summary {
    results.results.values().fold(
        Summary {
            files: results.results.len(),
            ..Summary::default()
        },
        |mut s, r| {
            s.imports += r.imports.len();
            s.variables += r.variables.len();
            s.parameters += r.parameters.len();
            s
        },
    )
}

fn issue_lines(out: &mut Vec<String>, heading: &str, issues: &[CodeIssue]) {
    if issues.is_empty() {
        return;
    }
    out.push(format!("  {heading} ({}):", issues.len()));
    for issue in issues {
        out.push(format!("    - {}:{} {}", issue.file, issue.line, issue.text));
    }
}

fn file_lines(out: &mut Vec<String>, filename: &str, result: &AnalysisResult) {
    out.push(format!("{filename}:"));
    issue_lines(out, "UNUSED IMPORTS", &result.imports);
    issue_lines(out, "UNUSED DEFINITIONS", &result.variables);
    issue_lines(out, "UNUSED PARAMETERS", &result.parameters);
}

/// Render the plain-text report.
pub fn render_plain(results: &WorkspaceResult) -> String {
    let summary = summarize(results);
    if summary.total() == 0 {
        return "No unused symbols found.".to_string();
    }

    let mut out = Vec::new();
    for (filename, result) in &results.results {
        if !result.is_empty() {
            file_lines(&mut out, filename, result);
        }
    }
    out.push(format!(
        "UNUSED SYMBOLS: {} ({} imports, {} definitions, {} parameters)",
        summary.total(),
        summary.imports,
        summary.variables,
        summary.parameters
    ));
    out.join("\n")
}

/// Prints findings in plain text format.
pub fn print_plain(results: &WorkspaceResult) {
    println!("{}", render_plain(results));
}

/// Prints findings in JSON format.
///
/// Falls back to the summary alone if serialization fails.
pub fn print_json(results: &WorkspaceResult) {
    let summary = summarize(results);
    match serde_json::to_string_pretty(&json!({ "results": results.results, "summary": summary })) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            tracing::warn!(error = %e, "JSON serialization failed");
            println!(
                "{{\"summary\": {{\"total\": {}}}}}",
                summary.total()
            );
        }
    }
}
