use crate::compare::{ComparisonOutcome, ValueComparison};
use crate::utils::string;

const BRANCH: &str = "├─ ";
const EDGE: &str = "└─ ";
const PIPE: &str = "│  ";
const EMPTY: &str = "   ";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tree {
    Node(String, Vec<Tree>),
    Leaf(Vec<String>),
}

pub use self::Tree::{Leaf, Node};

pub fn draw_tree(tree: &Tree) -> String {
    let mut output = String::new();
    draw(&mut output, tree, "", "");
    output
}

fn draw(output: &mut String, tree: &Tree, first_prefix: &str, rest_prefix: &str) {
    match tree {
        Node(title, children) => {
            push_line(output, first_prefix, title);

            let last = children.len().saturating_sub(1);
            for (i, child) in children.iter().enumerate() {
                let (branch, continuation) = if i == last { (EDGE, EMPTY) } else { (BRANCH, PIPE) };
                draw(
                    output,
                    child,
                    &format!("{}{}", rest_prefix, branch),
                    &format!("{}{}", rest_prefix, continuation),
                );
            }
        }
        Leaf(lines) => {
            for (i, line) in lines.iter().enumerate() {
                let prefix = if i == 0 { first_prefix } else { rest_prefix };
                push_line(output, prefix, line);
            }
        }
    }
}

fn push_line(output: &mut String, prefix: &str, line: &str) {
    output.push_str(prefix);
    output.push_str(line);
    output.push('\n');
}

pub fn text_block(content: &str) -> String {
    let prefixed_content = string::prefix_lines("│ ", content);

    if content.ends_with('\n') {
        format!("╭\n{}╰", prefixed_content)
    } else {
        format!("╭\n{}\n╰ (No newline at end)", prefixed_content)
    }
}

// ERROR FORMATTING

pub fn tree_from_outcome(outcome: &ComparisonOutcome) -> Vec<Tree> {
    let mut categories = vec![];

    if let ValueComparison::Diff { expected, got } = &outcome.output {
        categories.push(Node(
            String::from("Combined output"),
            show_string_diff(expected, got),
        ));
    }

    if let ValueComparison::Diff { expected, got } = outcome.exit_code {
        categories.push(Node(
            String::from("Exit code"),
            show_single_line_diff(show_exit_code(expected), show_exit_code(got)),
        ));
    }

    categories
}

pub fn tree_from_error(message: &str, causes: Vec<String>) -> Vec<Tree> {
    vec![Node(message.to_owned(), vec![Leaf(causes)])]
}

fn show_string_diff(expected: &str, got: &str) -> Vec<Tree> {
    let expected_lines = string_to_lines(&format!("Expected\n{}", text_block(expected)));
    let got_lines = string_to_lines(&format!("Got\n{}", text_block(got)));

    vec![Leaf(expected_lines), Leaf(got_lines)]
}

fn string_to_lines(str: &str) -> Vec<String> {
    str.lines().map(|x| x.to_owned()).collect()
}

fn show_exit_code(exit_code: Option<i32>) -> String {
    exit_code.map_or_else(|| String::from("<terminated by signal>"), |code| code.to_string())
}

fn show_single_line_diff(expected: String, got: String) -> Vec<Tree> {
    vec![
        Node(String::from("Expected"), vec![Leaf(vec![expected])]),
        Node(String::from("Got"), vec![Leaf(vec![got])]),
    ]
}
