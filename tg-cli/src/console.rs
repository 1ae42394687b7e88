//! Terminal interaction: confirmation prompts, progress lines and tables

use std::io;

use anyhow::{Context, Result, bail};
use colored::*;
use dialoguer::Confirm;
use is_terminal::IsTerminal;
use unicode_width::UnicodeWidthStr;

use crate::import::{NoticeLevel, UserChannel};

/// [`UserChannel`] on stdin/stdout
#[derive(Debug, Clone, Copy)]
pub struct ConsoleChannel {
    assume_yes: bool,
}

impl ConsoleChannel {
    /// With `assume_yes` every confirmation is accepted without asking
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl UserChannel for ConsoleChannel {
    fn confirm(&self, message: &str) -> Result<bool> {
        if self.assume_yes {
            log::info!("Auto-confirmed: {}", message);
            return Ok(true);
        }
        if !io::stdin().is_terminal() {
            bail!("Confirmation required but stdin is not a terminal, pass --yes to proceed");
        }

        Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact()
            .context("Failed to read confirmation")
    }

    fn notice(&self, level: NoticeLevel, message: &str) {
        println!("{}", notice_line(level, message));
    }
}

fn notice_line(level: NoticeLevel, message: &str) -> String {
    let mark = match level {
        NoticeLevel::Success => "✓".green(),
        NoticeLevel::Failure => "✗".red(),
    };
    format!("{} {}", mark, message)
}

/// Render rows as a left-aligned table with a bold header line
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
    for row in rows {
        for (col, cell) in row.iter().enumerate() {
            if col < widths.len() {
                widths[col] = widths[col].max(cell.width());
            }
        }
    }

    let header_line = format_line(headers.iter().copied(), &widths);
    let mut out = format!("{}\n", header_line.bold());
    for row in rows {
        out.push_str(&format_line(row.iter().map(|c| c.as_str()), &widths));
        out.push('\n');
    }
    out
}

fn format_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.width());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    padded.join("  ").trim_end().to_string()
}
