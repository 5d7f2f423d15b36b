//! Display utilities for the deckhand CLI

use console::{style, StyledObject};
use deckhand_engine::target_name;
use deckhand_types::{OutputSink, Target, Workspace};
use std::io::Write;
use std::sync::Arc;

/// Output sink printing transfer progress to stdout
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    quiet: bool,
}

impl ConsoleSink {
    /// Create a sink; a quiet sink prints nothing
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl OutputSink for ConsoleSink {
    fn append(&self, text: &str) {
        if self.quiet {
            return;
        }
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "{}", highlight(text));
        let _ = stdout.flush();
    }

    fn append_line(&self, text: &str) {
        if self.quiet {
            return;
        }
        println!("{}", highlight(text));
    }
}

/// Color transfer outcome markers
fn highlight(text: &str) -> StyledObject<&str> {
    if text.starts_with("[OK]") {
        style(text).green()
    } else if text.starts_with("[ERROR") {
        style(text).red()
    } else {
        style(text)
    }
}

/// Print the configured targets
pub fn display_targets(workspace: &dyn Workspace, targets: &[Arc<Target>], active: &[Arc<Target>]) {
    println!(
        "{} {}",
        style("⚓").blue().bold(),
        style(format!("Targets of {}", workspace.root_path().display()))
            .bold()
            .underlined()
    );

    if targets.is_empty() {
        println!("  {}", style(workspace.translate("targets.noneDefined", &[])).yellow());
        return;
    }

    for target in targets {
        let is_active = active.iter().any(|a| a.index == target.index);
        let marker = if is_active {
            style("●").green()
        } else {
            style("○").dim()
        };
        println!(
            "  {} {:>2}. {} ({})",
            marker,
            target.index + 1,
            style(target_name(target, workspace)).cyan(),
            style(target.type_or_default()).yellow()
        );
        if let Some(description) = target.description.as_deref().map(str::trim) {
            if !description.is_empty() {
                println!("        {}", style(description).dim());
            }
        }
    }
}

/// Print a configuration document under a heading
pub fn display_config(heading: &str, document: &str) {
    println!("{} {}", style("⚙").blue().bold(), style(heading).bold());
    println!("{}", document.trim_end());
}
