//! Console reporter.
//!
//! Renders journal lines, section banners, disk-usage tables and the boxed
//! summary to stdout. Styling follows [`Theme`]. Console write failures are
//! ignored; the log file is the audit trail.

use super::table::{filesystem_table, usage_table};
use super::theme::Theme;
use crate::crash;
use crossterm::style::Stylize;
use reclaim_core::{DiskSnapshot, LogEntry, Reporter, Summary};
use std::fmt::Display;
use std::io::{self, Write};
use std::path::Path;

fn emit(line: impl Display) {
    let _ = writeln!(io::stdout().lock(), "{line}");
}

/// Terminal implementation of [`Reporter`].
#[derive(Debug, Clone, Default)]
pub struct Output {
    theme: Theme,
}

impl Output {
    /// Create a new output handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Banner line for a stage title, padded with rules to the banner width.
    pub fn banner(&self, title: &str) -> String {
        let label = format!("── {title} ");
        let width = label.chars().count();
        let rule = "─".repeat(self.theme.layout.banner_width.saturating_sub(width));
        format!("{label}{rule}")
    }

    /// Box the given lines with a double border.
    pub fn boxed(&self, lines: &[String]) -> Vec<String> {
        let inner = lines
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0)
            .max(self.theme.layout.min_box_width);

        let mut out = Vec::with_capacity(lines.len() + 2);
        out.push(format!("╔{}╗", "═".repeat(inner + 2)));
        for line in lines {
            let pad = inner - line.chars().count();
            out.push(format!("║ {line}{} ║", " ".repeat(pad)));
        }
        out.push(format!("╚{}╝", "═".repeat(inner + 2)));
        out
    }
}

impl Reporter for Output {
    fn log_opened(&self, path: &Path) {
        crash::remember_log(path);
    }

    fn section(&self, title: &str) {
        emit("");
        emit(self.banner(title).with(self.theme.colors.header).bold());
    }

    fn log(&self, entry: &LogEntry) {
        let (icon, color) = self.theme.level_style(entry.level);
        let stamp = format!("[{}]", entry.stamp).with(self.theme.colors.secondary);
        if entry.message.starts_with("  ") {
            emit(format_args!("{stamp}   {}", entry.message.as_str().with(color)));
        } else {
            emit(format_args!(
                "{stamp} {} {}",
                icon.with(color),
                entry.message.as_str().with(color)
            ));
        }
    }

    fn snapshot(&self, _label: &str, snapshot: &DiskSnapshot) {
        if let Some(rows) = &snapshot.usage {
            if !rows.is_empty() {
                emit(usage_table(rows));
            }
        }
        if let Some(fs) = &snapshot.filesystem {
            emit(filesystem_table(fs));
        }
    }

    fn summary(&self, summary: &Summary) {
        let mut lines = summary.header();
        lines.push(String::new());
        lines.extend(summary.checklist());

        let colors = &self.theme.colors;
        let mark_color = if summary.is_clean() {
            colors.success
        } else {
            colors.warning
        };

        emit("");
        for line in self.boxed(&lines) {
            emit(line.with(mark_color));
        }
        if let Some(hint) = summary.hint() {
            emit(format_args!(
                "{} {}",
                self.theme.icons.info.with(colors.warning),
                hint.with(colors.warning).bold()
            ));
        }
    }
}
