//! Worked examples: the part of the first `dd` after the "Examples" rubric.

use super::text_of;
use docbind_model::{CodeLine, ExampleCode, LineKind, TestCase, TestPart};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static SEL_DD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dd").unwrap());
static SEL_PRE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("pre").unwrap());

const PROMPT: &str = ">>>";

fn is_examples_rubric(el: &ElementRef) -> bool {
    el.value().name() == "p"
        && el.value().classes().any(|c| c == "rubric")
        && text_of(*el) == "Examples"
}

/// Test case `<name>Test` from the page's examples, if it has any.
pub fn parse_examples(html: &Html, name: &str) -> Option<TestCase> {
    let dd = html.select(&SEL_DD).next()?;
    let nodes: Vec<ElementRef> = dd
        .children()
        .filter_map(ElementRef::wrap)
        .skip_while(|el| !is_examples_rubric(el))
        .skip(1)
        .collect();
    let mut case = TestCase {
        name: format!("{}Test", name),
        parts: Vec::new(),
    };
    for el in nodes {
        if el.value().name() == "p" {
            let text = text_of(el);
            let text = text.trim();
            if !text.is_empty() {
                case.parts.push(TestPart::Comment(text.to_string()));
            }
            continue;
        }
        let pre = if el.value().name() == "pre" {
            Some(el)
        } else {
            el.select(&SEL_PRE).next()
        };
        if let Some(pre) = pre {
            case.parts.push(TestPart::Example(parse_example_code(&text_of(pre))));
        }
    }
    if case.parts.is_empty() {
        return None;
    }
    Some(case)
}

/// Classify the lines of an interactive session: prompts become commands,
/// `#` lines comments, and consecutive other lines one output block.
pub fn parse_example_code(text: &str) -> ExampleCode {
    let mut lines: Vec<CodeLine> = Vec::new();
    for line in text.trim().lines() {
        if line.starts_with(PROMPT) {
            let mut cmd = line.replace(PROMPT, "");
            if cmd.contains("np.") {
                cmd = cmd.replace('[', "{").replace(']', "}");
            }
            lines.push(CodeLine {
                kind: LineKind::Cmd,
                text: vec![cmd],
            });
            continue;
        }
        if line.starts_with('#') {
            lines.push(CodeLine {
                kind: LineKind::Comment,
                text: vec![line.replace('#', "//")],
            });
            continue;
        }
        match lines.last_mut() {
            Some(last) if last.kind == LineKind::Output => last.text.push(line.to_string()),
            _ => lines.push(CodeLine {
                kind: LineKind::Output,
                text: vec![line.to_string()],
            }),
        }
    }
    ExampleCode {
        text: text.to_string(),
        lines,
    }
}
