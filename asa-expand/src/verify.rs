use asa_config_core::ConfigLine;
use serde::Serialize;

use crate::verify_refs::{reference_findings, FindingSeverity, VerifyFinding};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    pub lines: usize,
    pub objects: usize,
    pub access_lists: usize,
    pub errors: usize,
    pub warnings: usize,
    pub issues: Vec<VerifyFinding>,
}

pub fn build_verify_report(lines: &[ConfigLine]) -> VerifyReport {
    let (catalog, issues) = reference_findings(lines);
    let errors = issues
        .iter()
        .filter(|issue| issue.severity == FindingSeverity::Error)
        .count();
    VerifyReport {
        lines: lines.len(),
        objects: catalog.len(),
        access_lists: lines
            .iter()
            .filter(|line| line.text.starts_with("access-list "))
            .count(),
        errors,
        warnings: issues.len() - errors,
        issues,
    }
}

pub fn render_verify_text(report: &VerifyReport) -> String {
    let mut out = Vec::new();
    out.push(format!(
        "check lines={} objects={} access_lists={}",
        report.lines, report.objects, report.access_lists
    ));
    out.push(format!(
        "result errors={} warnings={}",
        report.errors, report.warnings
    ));
    out.push("issues".to_string());
    if report.issues.is_empty() {
        out.push("- none".to_string());
        return out.join("\n");
    }
    for issue in &report.issues {
        let sev = match issue.severity {
            FindingSeverity::Error => "error",
            FindingSeverity::Warning => "warning",
        };
        out.push(format!("- [{sev}] {}: {}", issue.code, issue.message));
    }
    out.join("\n")
}
