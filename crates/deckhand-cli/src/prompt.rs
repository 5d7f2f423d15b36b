//! Terminal prompts

use async_trait::async_trait;
use console::style;
use deckhand_types::{ChoiceItem, Error, Result, UserInterface};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{FuzzySelect, Select};
use tracing::debug;

/// Prompts on the controlling terminal with dialoguer
#[derive(Debug, Clone, Copy)]
pub struct TerminalUi {
    fuzzy: bool,
    show_detail: bool,
}

impl TerminalUi {
    /// Create a terminal UI
    pub fn new(fuzzy: bool, show_detail: bool) -> Self {
        Self { fuzzy, show_detail }
    }

    fn render(&self, item: &ChoiceItem) -> String {
        let mut line = item.label.clone();
        if !item.description.is_empty() {
            line.push_str(&format!("  {}", style(&item.description).dim()));
        }
        if self.show_detail && !item.detail.is_empty() {
            line.push_str(&format!("  [{}]", item.detail));
        }
        line
    }
}

#[async_trait]
impl UserInterface for TerminalUi {
    async fn show_choice(&self, items: &[ChoiceItem], placeholder: &str) -> Result<Option<usize>> {
        let lines: Vec<String> = items.iter().map(|item| self.render(item)).collect();
        let prompt = placeholder.to_string();
        let fuzzy = self.fuzzy;

        let choice = tokio::task::spawn_blocking(move || {
            let theme = ColorfulTheme::default();
            if fuzzy {
                FuzzySelect::with_theme(&theme)
                    .with_prompt(prompt)
                    .items(&lines)
                    .default(0)
                    .interact_opt()
            } else {
                Select::with_theme(&theme)
                    .with_prompt(prompt)
                    .items(&lines)
                    .default(0)
                    .interact_opt()
            }
        })
        .await
        .map_err(|e| Error::prompt(e.to_string()))?
        .map_err(|e| Error::prompt(e.to_string()))?;

        debug!("Prompt answered with {:?}", choice);
        Ok(choice)
    }

    async fn show_warning(&self, message: &str) {
        eprintln!("{} {}", style("⚠").yellow().bold(), style(message).yellow());
    }
}
