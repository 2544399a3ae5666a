// src/display.rs

//! Rendering the package diff for review

use crate::error::Result;
use crate::sync::diff::PackageDiff;
use colored::{ColoredString, Colorize};
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use tracing::warn;

const REASON_MISSING: &str = "Missing from system";
const REASON_STRICT: &str = "Not in definitions (strict mode)";
const REASON_MANAGED: &str = "No longer managed by ditto";

/// Shows a diff to the user before anything is applied
pub trait Presenter {
    fn render(&self, diff: &PackageDiff, strict: bool) -> Result<()>;
}

/// Box-drawn table, optionally piped through a pager
#[derive(Debug, Clone, Default)]
pub struct TablePresenter {
    pager: Option<Vec<String>>,
}

impl TablePresenter {
    pub fn new(pager: Option<Vec<String>>) -> Self {
        Self { pager }
    }

    fn show(&self, text: &str) -> Result<()> {
        if let Some((program, args)) = self.pager.as_ref().and_then(|p| p.split_first()) {
            match page(program, args, text) {
                Ok(()) => return Ok(()),
                Err(e) => warn!("Pager `{}` failed, printing directly: {}", program, e),
            }
        }

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

impl Presenter for TablePresenter {
    fn render(&self, diff: &PackageDiff, strict: bool) -> Result<()> {
        if !diff.has_changes(strict) {
            return Ok(());
        }
        self.show(&format!("\n{}\n", render_table(diff, strict)))
    }
}

struct Row<'a> {
    install: bool,
    package: &'a str,
    reason: &'a str,
}

/// Render the diff as an Action / Package / Reason table
pub fn render_table(diff: &PackageDiff, strict: bool) -> String {
    let mut rows: Vec<Row> = diff
        .to_add
        .iter()
        .map(|pkg| Row {
            install: true,
            package: pkg,
            reason: REASON_MISSING,
        })
        .collect();

    if strict {
        rows.extend(diff.to_remove_strict.iter().map(|pkg| Row {
            install: false,
            package: pkg,
            reason: REASON_STRICT,
        }));
    }

    rows.extend(diff.to_remove_from_tool.iter().map(|pkg| Row {
        install: false,
        package: pkg,
        reason: REASON_MANAGED,
    }));

    let headers = ["Action", "Package", "Reason"];
    let widths = [
        headers[0].len().max("INSTALL".len()),
        rows.iter()
            .map(|r| r.package.chars().count())
            .max()
            .unwrap_or(0)
            .max(headers[1].len()),
        rows.iter()
            .map(|r| r.reason.len())
            .max()
            .unwrap_or(0)
            .max(headers[2].len()),
    ];

    let mut out = String::new();
    out.push_str(&border('┌', '┬', '┐', &widths));
    out.push_str(&format!(
        "│ {} │ {} │ {} │\n",
        pad(headers[0], widths[0]).bold(),
        pad(headers[1], widths[1]).bold(),
        pad(headers[2], widths[2]).bold(),
    ));
    out.push_str(&border('├', '┼', '┤', &widths));

    for row in &rows {
        let action: ColoredString = if row.install {
            pad("INSTALL", widths[0]).green()
        } else {
            pad("REMOVE", widths[0]).red()
        };
        out.push_str(&format!(
            "│ {} │ {} │ {} │\n",
            action,
            pad(row.package, widths[1]),
            pad(row.reason, widths[2]),
        ));
    }

    out.push_str(&border('└', '┴', '┘', &widths));
    out
}

fn pad(text: &str, width: usize) -> String {
    format!("{:<width$}", text, width = width)
}

fn border(left: char, mid: char, right: char, widths: &[usize]) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{}{}{}\n", left, segments.join(&mid.to_string()), right)
}

fn page(program: &str, args: &[String], text: &str) -> std::io::Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .spawn()?;

    // A pager that quits before reading everything closes the pipe early
    if let Some(mut stdin) = child.stdin.take() {
        if let Err(e) = stdin.write_all(text.as_bytes()) {
            if e.kind() != ErrorKind::BrokenPipe {
                let _ = child.wait();
                return Err(e);
            }
        }
    }

    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!("exited with {}", status)))
    }
}
