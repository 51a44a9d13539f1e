//! CLI output formatting for all pipeline stages.
//!
//! Each stage has a pure `format_*` function returning lines and a `print_*`
//! wrapper that writes them to stdout. Tests exercise the formatters; the
//! wrappers stay trivial. Diagnostics (warnings, template errors) go through
//! `log` instead and are not part of this output.
//!
//! ```text
//! style
//!     style.scss → style.css (4210 bytes, 2 images inlined)
//! pages
//!     linux.html
//!     mac.html
//! compress
//!     3 cached, 1 compressed
//! ```

use crate::compress::CompressReport;
use crate::pages::PageReport;
use crate::style::{StyleOutput, StyleReport};
use crate::tasks::TaskReport;
use std::path::{Path, PathBuf};

const INDENT: &str = "    ";

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn style_line(out: &StyleOutput) -> String {
    let mut line = format!(
        "{INDENT}{} → {} ({} bytes",
        file_name(&out.source),
        out.name.display(),
        out.bytes
    );
    if out.inline.inlined > 0 {
        line.push_str(&format!(", {} images inlined", out.inline.inlined));
    }
    if out.inline.too_large > 0 {
        line.push_str(&format!(", {} too large to inline", out.inline.too_large));
    }
    line.push(')');
    line
}

pub fn format_style_report(report: &StyleReport) -> Vec<String> {
    let mut lines = vec!["style".to_string()];
    lines.extend(report.outputs.iter().map(style_line));
    for error in &report.errors {
        lines.push(format!("{INDENT}error: {error}"));
    }
    lines
}

pub fn format_script_report(copied: &[PathBuf]) -> Vec<String> {
    let mut lines = vec!["scripts".to_string()];
    if copied.is_empty() {
        lines.push(format!("{INDENT}(none)"));
    }
    lines.extend(copied.iter().map(|p| format!("{INDENT}{}", p.display())));
    lines
}

pub fn format_page_report(report: &PageReport) -> Vec<String> {
    let mut lines = vec!["pages".to_string()];
    lines.extend(report.written.iter().map(|p| format!("{INDENT}{}", p.display())));
    for failure in &report.failures {
        lines.push(format!("{INDENT}{}: failed", file_name(&failure.page)));
    }
    lines
}

pub fn format_compress_report(report: &CompressReport) -> Vec<String> {
    vec!["compress".to_string(), format!("{INDENT}{}", report.stats)]
}

/// Lines for any stage report.
pub fn format_task_report(report: &TaskReport) -> Vec<String> {
    match report {
        TaskReport::Style(r) => format_style_report(r),
        TaskReport::Scripts(r) => format_script_report(r),
        TaskReport::Pages(r) => format_page_report(r),
        TaskReport::Compress(r) => format_compress_report(r),
    }
}

pub fn print_task_report(report: &TaskReport) {
    for line in format_task_report(report) {
        println!("{}", line);
    }
}
