//! Result labels shared by the text output and the TUI.
//!
//! Each entry is shown as its name, styled by field, over a detail line
//! giving the song count and where the entry sits in the hierarchy.

use quarry_core::{Crumb, Field, SearchOutcome, SearchResult};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use std::fmt;

/// How the name of a node in a given field is presented.
#[derive(Debug, Clone, Copy)]
pub struct FieldStyle {
    pub bold: bool,
    pub italic: bool,
    pub upper: bool,
}

const FIELD_STYLES: [FieldStyle; Field::COUNT] = [
    // Genre
    FieldStyle {
        bold: false,
        italic: false,
        upper: true,
    },
    // Artist
    FieldStyle {
        bold: true,
        italic: false,
        upper: false,
    },
    // Album
    FieldStyle {
        bold: false,
        italic: true,
        upper: false,
    },
    // Title
    FieldStyle {
        bold: false,
        italic: false,
        upper: false,
    },
];

impl FieldStyle {
    pub fn of(field: Field) -> &'static FieldStyle {
        &FIELD_STYLES[field.index()]
    }

    /// Name text after case mapping.
    pub fn apply(&self, name: &str) -> String {
        if self.upper {
            name.to_uppercase()
        } else {
            name.to_string()
        }
    }

    pub fn modifier(&self) -> Modifier {
        let mut modifier = Modifier::empty();
        if self.bold {
            modifier |= Modifier::BOLD;
        }
        if self.italic {
            modifier |= Modifier::ITALIC;
        }
        modifier
    }

    /// Styled span for a name in this field.
    pub fn span(&self, name: &str, base: Style) -> Span<'static> {
        Span::styled(self.apply(name), base.add_modifier(self.modifier()))
    }

    /// Name wrapped in terminal escape sequences.
    pub fn ansi(&self, name: &str) -> String {
        use crossterm::style::Stylize;

        let mut styled = self.apply(name).stylize();
        if self.bold {
            styled = styled.bold();
        }
        if self.italic {
            styled = styled.italic();
        }
        styled.to_string()
    }
}

/// Display name of a result, case-mapped for its field.
pub fn display_name(field: Field, name: &str) -> String {
    FieldStyle::of(field).apply(name)
}

/// The second line of a result label.
///
/// `lead` holds the count and preposition; `crumb` is the enclosing entry
/// named after it, if any.
#[derive(Debug, PartialEq, Eq)]
pub struct Detail<'a> {
    pub lead: String,
    pub crumb: Option<&'a Crumb>,
}

impl<'a> Detail<'a> {
    pub fn of(result: &'a SearchResult) -> Self {
        // a title names its artist when it has one, not its album
        let crumb = if result.field == Field::Genre {
            None
        } else {
            result.ancestors.get(1).or_else(|| result.ancestors.first())
        };

        let mut lead = String::new();
        if result.field != Field::Title {
            let count = result.match_count();
            lead.push_str(&format!(
                "{} {}",
                count,
                if count == 1 { "song" } else { "songs" }
            ));
            if result.field == Field::Genre || crumb.is_some() {
                lead.push(' ');
            }
        }

        if result.field == Field::Genre {
            lead.push_str("of this genre");
        } else if let Some(crumb) = crumb {
            lead.push_str(if crumb.field == Field::Album { "on " } else { "by " });
        }

        Detail { lead, crumb }
    }

    /// Detail line as ratatui spans.
    pub fn line(&self, base: Style) -> Line<'static> {
        let mut spans = vec![Span::styled(self.lead.clone(), base)];
        if let Some(crumb) = self.crumb {
            spans.push(FieldStyle::of(crumb.field).span(&crumb.name, base));
        }
        Line::from(spans)
    }

    /// Detail line with terminal styling on the crumb.
    pub fn ansi(&self) -> String {
        match self.crumb {
            Some(crumb) => format!("{}{}", self.lead, FieldStyle::of(crumb.field).ansi(&crumb.name)),
            None => self.lead.clone(),
        }
    }
}

impl fmt::Display for Detail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lead)?;
        if let Some(crumb) = self.crumb {
            f.write_str(&display_name(crumb.field, &crumb.name))?;
        }
        Ok(())
    }
}

/// "N results", or "S of T results shown" when truncated.
pub fn summary(outcome: &SearchOutcome) -> String {
    let total = outcome.total();
    let noun = if total == 1 { "result" } else { "results" };
    if outcome.hidden > 0 {
        format!("{} of {} {} shown", outcome.shown(), total, noun)
    } else {
        format!("{} {}", total, noun)
    }
}
