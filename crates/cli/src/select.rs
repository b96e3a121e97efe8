//! Toggleable selection menus.
//!
//! A menu partitions its items into a primary bucket shown by default and a
//! secondary bucket hidden behind one synthetic toggle row (for instance
//! types: the sold-out ones). Row building is pure and unit-tested;
//! terminal driving sits behind [`Prompt`] so tests can script key
//! sequences while production uses `dialoguer`.

use anyhow::{ensure, Result};
use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;

/// An item that can appear in a selection menu.
pub trait SelectItem {
    /// Rendered menu label.
    fn label(&self) -> String;

    /// Sort key within a bucket. Equal keys keep input order.
    fn sort_key(&self) -> String {
        String::new()
    }

    /// Primary-bucket membership. Secondary items hide behind the toggle.
    fn available(&self) -> bool {
        true
    }
}

/// Result of driving a selection menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Index of the chosen item in the input slice.
    Chosen(usize),
    /// The user backed out with Esc or Ctrl-C. Distinct from [`Self::Empty`]:
    /// declining to choose is not the same as having nothing to offer.
    Cancelled,
    /// The input slice was empty; no prompt was shown.
    Empty,
}

/// One rendered row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Row {
    /// An item, by index into the input slice.
    Item(usize),
    /// The synthetic show/hide row for the secondary bucket.
    Toggle { hidden_count: usize, showing: bool },
}

/// Terminal driver for a menu. One call renders one prompt with the cursor
/// on the first row.
pub trait Prompt {
    /// Show `options` under `title`. `Ok(None)` means the user backed out.
    ///
    /// # Errors
    /// Fails when the terminal cannot be driven.
    fn choose(&mut self, title: &str, options: &[String]) -> Result<Option<usize>>;
}

/// Production driver backed by `dialoguer`.
pub struct DialoguerPrompt;

impl Prompt for DialoguerPrompt {
    fn choose(&mut self, title: &str, options: &[String]) -> Result<Option<usize>> {
        match Select::with_theme(&ColorfulTheme::default())
            .with_prompt(title)
            .items(options)
            .default(0)
            .interact_opt()
        {
            Ok(choice) => Ok(choice),
            // Ctrl-C inside the raw-mode prompt surfaces as an interrupted
            // read, not a signal.
            Err(dialoguer::Error::IO(err)) if err.kind() == std::io::ErrorKind::Interrupted => {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// A selection menu over a slice of items.
pub struct SelectMenu<'a, T: SelectItem> {
    items: &'a [T],
    title: &'a str,
    /// Noun for the toggle row, e.g. "unavailable types". `None` shows
    /// every item with no toggle.
    hidden_noun: Option<&'a str>,
    show_hidden: bool,
}

impl<'a, T: SelectItem> SelectMenu<'a, T> {
    /// Menu listing every item, with no toggle row.
    #[must_use]
    pub fn new(items: &'a [T], title: &'a str) -> Self {
        Self {
            items,
            title,
            hidden_noun: None,
            show_hidden: false,
        }
    }

    /// Hide non-available items behind a toggle row labelled with `noun`.
    /// `initially_shown` starts the menu with the bucket expanded.
    #[must_use]
    pub fn with_toggle(mut self, noun: &'a str, initially_shown: bool) -> Self {
        self.hidden_noun = Some(noun);
        self.show_hidden = initially_shown;
        self
    }

    /// Drive the menu to a terminal selection.
    ///
    /// Picking the toggle row flips the bucket and re-renders from the top;
    /// the toggle state lives only for the duration of this call.
    ///
    /// # Errors
    /// Propagates driver failures.
    pub fn run(&self, prompt: &mut dyn Prompt) -> Result<Selection> {
        if self.items.is_empty() {
            return Ok(Selection::Empty);
        }

        let mut show_hidden = self.show_hidden;

        loop {
            let rows = self.build_rows(show_hidden);
            let labels: Vec<String> = rows.iter().map(|row| self.row_label(*row)).collect();

            let Some(index) = prompt.choose(self.title, &labels)? else {
                return Ok(Selection::Cancelled);
            };
            ensure!(
                index < rows.len(),
                "prompt returned row {index} of {}",
                rows.len()
            );

            match rows[index] {
                Row::Item(item) => return Ok(Selection::Chosen(item)),
                Row::Toggle { .. } => show_hidden = !show_hidden,
            }
        }
    }

    /// Visible rows for one render: sorted primary bucket, then (when
    /// expanded) the sorted secondary bucket, then the toggle row.
    fn build_rows(&self, show_hidden: bool) -> Vec<Row> {
        if self.hidden_noun.is_none() {
            let mut all: Vec<usize> = (0..self.items.len()).collect();
            all.sort_by_key(|&i| self.items[i].sort_key());
            return all.into_iter().map(Row::Item).collect();
        }

        let mut primary = Vec::new();
        let mut hidden = Vec::new();
        for (index, item) in self.items.iter().enumerate() {
            if item.available() {
                primary.push(index);
            } else {
                hidden.push(index);
            }
        }
        primary.sort_by_key(|&i| self.items[i].sort_key());
        hidden.sort_by_key(|&i| self.items[i].sort_key());

        let hidden_count = hidden.len();
        let mut rows: Vec<Row> = primary.into_iter().map(Row::Item).collect();
        if show_hidden {
            rows.extend(hidden.into_iter().map(Row::Item));
        }
        if hidden_count > 0 {
            rows.push(Row::Toggle {
                hidden_count,
                showing: show_hidden,
            });
        }
        rows
    }

    fn row_label(&self, row: Row) -> String {
        match row {
            Row::Item(index) => self.items[index].label(),
            Row::Toggle {
                hidden_count,
                showing,
            } => {
                let noun = self.hidden_noun.unwrap_or("hidden items");
                let text = if showing {
                    format!("[ Hide {noun} ]")
                } else {
                    format!("[ Show {hidden_count} {noun} ]")
                };
                text.bright_black().to_string()
            }
        }
    }
}
