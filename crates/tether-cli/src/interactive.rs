//! Interactive subscription selection for the onboard command.
//!
//! Used when `-i` is passed without explicit targets.
//! Uses dialoguer for terminal UI prompts.

use std::io::{self, Write};

use anyhow::Result;
use console::style;
use dialoguer::{Confirm, MultiSelect, theme::ColorfulTheme};

use tether_core::types::Target;

/// Result of the interactive flow.
#[derive(Debug, Clone)]
pub struct SelectionResult {
    /// Chosen subscription ids, in candidate order
    pub ids: Vec<String>,
    /// Whether the user confirmed the run
    pub confirmed: bool,
}

/// Prompts for the subscriptions to onboard.
pub struct InteractiveSelection<W: Write = io::Stdout> {
    candidates: Vec<Target>,
    simulate: bool,
    /// Skip the final confirmation
    yes: bool,
    writer: W,
    theme: ColorfulTheme,
}

impl InteractiveSelection<io::Stdout> {
    pub fn new(candidates: Vec<Target>, simulate: bool, yes: bool) -> Self {
        Self {
            candidates,
            simulate,
            yes,
            writer: io::stdout(),
            theme: ColorfulTheme::default(),
        }
    }
}

impl<W: Write> InteractiveSelection<W> {
    /// Run the prompts.
    ///
    /// Flow:
    /// 1. Multi-select over the accessible subscriptions (none preselected)
    /// 2. Show the selection and confirm
    pub fn collect(&mut self) -> Result<SelectionResult> {
        self.print_header()?;

        let ids = self.prompt_subscriptions()?;
        if ids.is_empty() {
            return Ok(SelectionResult {
                ids,
                confirmed: false,
            });
        }

        let confirmed = self.show_summary_and_confirm(&ids)?;
        Ok(SelectionResult { ids, confirmed })
    }

    fn print_header(&mut self) -> Result<()> {
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "{}",
            style("  Tether Onboarding").bold().cyan()
        )?;
        if self.simulate {
            writeln!(
                self.writer,
                "  {}",
                style("WhatIf mode: no changes will be applied").yellow()
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn prompt_subscriptions(&self) -> Result<Vec<String>> {
        let labels: Vec<String> = self
            .candidates
            .iter()
            .map(|t| format!("{}  {}", t.name, style(&t.id).dim()))
            .collect();

        let selections = MultiSelect::with_theme(&self.theme)
            .with_prompt("Subscriptions to onboard (space to toggle, enter to confirm)")
            .items(&labels)
            .interact()?;

        Ok(selections
            .into_iter()
            .map(|index| self.candidates[index].id.clone())
            .collect())
    }

    fn show_summary_and_confirm(&mut self, ids: &[String]) -> Result<bool> {
        writeln!(self.writer)?;
        writeln!(self.writer, "  {}", style("Selected subscriptions:").bold())?;
        for target in self.candidates.iter().filter(|t| ids.contains(&t.id)) {
            writeln!(self.writer, "    • {}", target)?;
        }
        writeln!(self.writer)?;

        if self.yes {
            return Ok(true);
        }

        let confirmed = Confirm::with_theme(&self.theme)
            .with_prompt(format!("Onboard {} subscription(s)?", ids.len()))
            .default(true)
            .interact()?;
        Ok(confirmed)
    }
}
