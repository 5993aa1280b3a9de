//! Reports describing the filter state of a page.

use std::fmt::Write as _;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::app::page::Page;
use crate::domain::model::{OptionView, UnresolvedTarget};

/// Output formats for `filter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum ReportFormat {
    /// One visible option label per line.
    Plain,
    /// Full report as JSON.
    Json,
    /// The page markup with filters applied.
    Html,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Plain => "plain",
            ReportFormat::Json => "json",
            ReportFormat::Html => "html",
        }
    }
}

/// Filter state of every binding on a page.
#[derive(Debug, Clone, Serialize)]
pub struct FilterReport {
    pub bindings: Vec<BindingReport>,
    pub unresolved: Vec<UnresolvedTarget>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BindingReport {
    pub key: String,
    pub target: String,
    pub filter: String,
    pub shown: usize,
    pub hidden: usize,
    pub options: Vec<OptionView>,
}

impl FilterReport {
    pub fn from_page(page: &Page) -> Self {
        let bindings = page
            .bindings()
            .iter()
            .enumerate()
            .map(|(index, binding)| {
                let outcome = page.outcome(index);
                BindingReport {
                    key: binding.key(),
                    target: binding.target.clone(),
                    filter: page.filter_text(index).to_owned(),
                    shown: outcome.shown,
                    hidden: outcome.hidden,
                    options: page.options(index),
                }
            })
            .collect();

        Self {
            bindings,
            unresolved: page.unresolved().to_vec(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Plain listing. With `show_hidden`, hidden options are listed too,
    /// marked with `-` while visible ones get `+`.
    pub fn to_plain(&self, show_hidden: bool) -> String {
        let mut out = String::new();
        let headed = self.bindings.len() > 1;

        for binding in &self.bindings {
            if headed {
                let _ = writeln!(
                    out,
                    "# {} -> {} ({}/{} shown)",
                    binding.key,
                    binding.target,
                    binding.shown,
                    binding.shown + binding.hidden
                );
            }
            for option in &binding.options {
                let marker = if option.selected { "*" } else { "" };
                match (show_hidden, option.visible) {
                    (false, true) => {
                        let _ = writeln!(out, "{}{}", option.label, marker);
                    }
                    (false, false) => {}
                    (true, visible) => {
                        let sign = if visible { '+' } else { '-' };
                        let _ = writeln!(out, "{sign} {}{}", option.label, marker);
                    }
                }
            }
        }
        out
    }
}
