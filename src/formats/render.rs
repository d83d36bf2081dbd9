//! Console rendering of character level diffs

use crate::text_diff::{Change, Segment};
use colored::Colorize;

const SEPARATOR: &str = "-------------------------";

/// Newlines inside a segment are padded so that a changed line ending stays
/// visible in the terminal
const NEWLINE: &str = "    \n";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiffStyle {
    /// ANSI colors: additions green, deletions red
    Colored,
    /// Inline markers `{+added+}` and `[-removed-]`
    Plain,
}

/// Decorate `text` according to its classification
pub fn paint(change: Change, text: &str, style: DiffStyle) -> String {
    match (style, change) {
        (_, Change::Unchanged) => text.to_owned(),
        (DiffStyle::Colored, Change::Added) => text.green().to_string(),
        (DiffStyle::Colored, Change::Removed) => text.red().to_string(),
        (DiffStyle::Plain, Change::Added) => format!("{{+{}+}}", text),
        (DiffStyle::Plain, Change::Removed) => format!("[-{}-]", text),
    }
}

fn separator(style: DiffStyle) -> String {
    match style {
        DiffStyle::Colored => SEPARATOR.black().bold().to_string(),
        DiffStyle::Plain => SEPARATOR.to_owned(),
    }
}

/// Render segments between two separator lines
pub fn render_diff(segments: &[Segment], style: DiffStyle) -> String {
    let mut output = separator(style);
    output.push('\n');

    for segment in segments {
        let painted = paint(segment.change, &segment.value, style);
        output.push_str(&painted.replace('\n', NEWLINE));
    }

    if !output.ends_with('\n') {
        output.push('\n')
    }

    output.push_str(&separator(style));
    output.push('\n');
    output
}
