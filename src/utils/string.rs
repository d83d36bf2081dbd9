use itertools::Itertools;

/// Prefix every line of `input`, keeping a trailing newline if present
///
/// An empty input counts as a single empty line.
pub fn prefix_lines(prefix: &str, input: &str) -> String {
    let body = input.strip_suffix('\n').unwrap_or(input);

    let mut output = body
        .split('\n')
        .map(|line| format!("{}{}", prefix, line))
        .join("\n");

    if input.ends_with('\n') {
        output.push('\n')
    }

    output
}

pub fn indent_lines(input: &str, indent_level: usize) -> String {
    prefix_lines(&" ".repeat(indent_level), input)
}
