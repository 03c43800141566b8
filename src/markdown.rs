//! Markup-to-presentation transform for message bodies.
//!
//! Assistant replies may contain a subset of markdown: ATX headings, `**`/`__`
//! strong and `*`/`_` emphasis, backtick code spans, `-`/`*` bullet lists, and
//! fenced code blocks. This module parses that subset into a presentation
//! tree and renders it with optional ANSI styling. Unterminated markers are
//! rendered as literal text.
//!
//! Parsing is pure and rendering is deterministic, so rendering the same
//! input twice yields byte-identical output.

/// ANSI escape code for bold text (used for headings and strong spans).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for italic text (used for emphasis spans).
const ANSI_ITALIC: &str = "\x1b[3m";

/// ANSI escape code for cyan text (used for code spans and blocks).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// An inline span within a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    /// Plain text.
    Text(String),

    /// An emphasized (`*`/`_`) span.
    Emphasis(String),

    /// A strong (`**`/`__`) span.
    Strong(String),

    /// A backtick code span.
    Code(String),
}

/// A block-level element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// An ATX heading with its level (1..=6).
    Heading {
        /// Heading level.
        level: u8,
        /// The heading's inline spans.
        spans: Vec<Inline>,
    },

    /// A paragraph of inline spans.
    Paragraph(Vec<Inline>),

    /// A bullet list; one entry of inline spans per item.
    List(Vec<Vec<Inline>>),

    /// A fenced code block, stored verbatim.
    CodeBlock(String),
}

/// The presentation tree produced from a message body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    /// The block-level elements in order.
    pub blocks: Vec<Block>,
}

impl Document {
    /// Returns true if the document renders nothing.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Render the document with optional ANSI styling.
    pub fn to_ansi(&self, use_color: bool) -> String {
        let mut out = String::new();
        for (idx, block) in self.blocks.iter().enumerate() {
            if idx > 0 {
                out.push_str("\n\n");
            }
            render_block(&mut out, block, use_color);
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

/// Parse a message body into a presentation tree.
pub fn parse(text: &str) -> Document {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut list_items: Vec<Vec<Inline>> = Vec::new();
    let mut code_lines: Option<Vec<String>> = None;

    fn flush_paragraph(paragraph: &mut Vec<String>, blocks: &mut Vec<Block>) {
        if !paragraph.is_empty() {
            let text = paragraph.join(" ");
            paragraph.clear();
            blocks.push(Block::Paragraph(parse_inlines(&text)));
        }
    }

    fn flush_list(list_items: &mut Vec<Vec<Inline>>, blocks: &mut Vec<Block>) {
        if !list_items.is_empty() {
            blocks.push(Block::List(std::mem::take(list_items)));
        }
    }

    for line in text.lines() {
        if let Some(lines) = &mut code_lines {
            if line.trim_start().starts_with("```") {
                blocks.push(Block::CodeBlock(lines.join("\n")));
                code_lines = None;
            } else {
                lines.push(line.to_string());
            }
            continue;
        }

        let trimmed = line.trim();

        if trimmed.starts_with("```") {
            flush_paragraph(&mut paragraph, &mut blocks);
            flush_list(&mut list_items, &mut blocks);
            code_lines = Some(Vec::new());
            continue;
        }

        if trimmed.is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
            flush_list(&mut list_items, &mut blocks);
            continue;
        }

        if let Some((level, rest)) = heading_level(trimmed) {
            flush_paragraph(&mut paragraph, &mut blocks);
            flush_list(&mut list_items, &mut blocks);
            blocks.push(Block::Heading {
                level,
                spans: parse_inlines(rest),
            });
            continue;
        }

        if let Some(item) = bullet_item(trimmed) {
            flush_paragraph(&mut paragraph, &mut blocks);
            list_items.push(parse_inlines(item));
            continue;
        }

        flush_list(&mut list_items, &mut blocks);
        paragraph.push(trimmed.to_string());
    }

    // An unterminated fence swallows the rest of the body as code
    if let Some(lines) = code_lines {
        blocks.push(Block::CodeBlock(lines.join("\n")));
    }
    flush_paragraph(&mut paragraph, &mut blocks);
    flush_list(&mut list_items, &mut blocks);

    Document { blocks }
}

/// Parse and render in one step.
pub fn render(text: &str, use_color: bool) -> String {
    parse(text).to_ansi(use_color)
}

fn heading_level(line: &str) -> Option<(u8, &str)> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if (1..=6).contains(&hashes) {
        let rest = &line[hashes..];
        if let Some(rest) = rest.strip_prefix(' ') {
            return Some((hashes as u8, rest.trim_start()));
        }
    }
    None
}

fn bullet_item(line: &str) -> Option<&str> {
    line.strip_prefix("- ").or_else(|| line.strip_prefix("* "))
}

/// Parse the inline markers within one line of text.
///
/// Markers without a matching close, and markers enclosing nothing, are kept
/// as literal text rather than dropped.
fn parse_inlines(text: &str) -> Vec<Inline> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    fn flush(current: &mut String, spans: &mut Vec<Inline>) {
        if !current.is_empty() {
            spans.push(Inline::Text(std::mem::take(current)));
        }
    }

    while i < chars.len() {
        let c = chars[i];
        match c {
            '`' => {
                if let Some(close) = find_single(&chars, i + 1, '`')
                    && close > i + 1
                {
                    flush(&mut current, &mut spans);
                    spans.push(Inline::Code(chars[i + 1..close].iter().collect()));
                    i = close + 1;
                } else {
                    current.push(c);
                    i += 1;
                }
            }
            '*' | '_' => {
                let doubled = chars.get(i + 1) == Some(&c);
                if doubled {
                    if let Some(close) = find_double(&chars, i + 2, c)
                        && close > i + 2
                    {
                        flush(&mut current, &mut spans);
                        spans.push(Inline::Strong(chars[i + 2..close].iter().collect()));
                        i = close + 2;
                    } else {
                        current.push(c);
                        current.push(c);
                        i += 2;
                    }
                } else if let Some(close) = find_single(&chars, i + 1, c)
                    && close > i + 1
                {
                    flush(&mut current, &mut spans);
                    spans.push(Inline::Emphasis(chars[i + 1..close].iter().collect()));
                    i = close + 1;
                } else {
                    current.push(c);
                    i += 1;
                }
            }
            _ => {
                current.push(c);
                i += 1;
            }
        }
    }

    flush(&mut current, &mut spans);
    spans
}

fn find_single(chars: &[char], from: usize, marker: char) -> Option<usize> {
    (from..chars.len()).find(|&j| chars[j] == marker)
}

fn find_double(chars: &[char], from: usize, marker: char) -> Option<usize> {
    (from..chars.len().saturating_sub(1))
        .find(|&j| chars[j] == marker && chars[j + 1] == marker)
}

fn render_block(out: &mut String, block: &Block, use_color: bool) {
    match block {
        Block::Heading { spans, .. } => {
            if use_color {
                out.push_str(ANSI_BOLD);
                render_spans_plain(out, spans);
                out.push_str(ANSI_RESET);
            } else {
                render_spans_plain(out, spans);
            }
        }
        Block::Paragraph(spans) => {
            render_spans(out, spans, use_color);
        }
        Block::List(items) => {
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push('\n');
                }
                out.push_str("  - ");
                render_spans(out, item, use_color);
            }
        }
        Block::CodeBlock(code) => {
            for (idx, line) in code.lines().enumerate() {
                if idx > 0 {
                    out.push('\n');
                }
                out.push_str("    ");
                if use_color {
                    out.push_str(ANSI_CYAN);
                    out.push_str(line);
                    out.push_str(ANSI_RESET);
                } else {
                    out.push_str(line);
                }
            }
        }
    }
}

fn render_spans(out: &mut String, spans: &[Inline], use_color: bool) {
    for span in spans {
        match span {
            Inline::Text(text) => out.push_str(text),
            Inline::Emphasis(text) => {
                if use_color {
                    out.push_str(ANSI_ITALIC);
                    out.push_str(text);
                    out.push_str(ANSI_RESET);
                } else {
                    out.push_str(text);
                }
            }
            Inline::Strong(text) => {
                if use_color {
                    out.push_str(ANSI_BOLD);
                    out.push_str(text);
                    out.push_str(ANSI_RESET);
                } else {
                    out.push_str(text);
                }
            }
            Inline::Code(text) => {
                if use_color {
                    out.push_str(ANSI_CYAN);
                    out.push_str(text);
                    out.push_str(ANSI_RESET);
                } else {
                    out.push_str(text);
                }
            }
        }
    }
}

/// Headings render their spans without nested styling; the whole line is bold.
fn render_spans_plain(out: &mut String, spans: &[Inline]) {
    for span in spans {
        match span {
            Inline::Text(text)
            | Inline::Emphasis(text)
            | Inline::Strong(text)
            | Inline::Code(text) => out.push_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_renders_nothing() {
        assert!(parse("").is_empty());
        assert_eq!(render("", true), "");
        assert_eq!(render("   \n\n  ", false), "");
    }

    #[test]
    fn heading_levels() {
        let doc = parse("## Refund policy");
        assert_eq!(
            doc.blocks,
            vec![Block::Heading {
                level: 2,
                spans: vec![Inline::Text("Refund policy".to_string())],
            }]
        );
        // Seven hashes is not a heading
        let doc = parse("####### nope");
        assert!(matches!(doc.blocks[0], Block::Paragraph(_)));
    }

    #[test]
    fn strong_and_emphasis() {
        let spans = parse_inlines("a **bold** and *soft* word");
        assert_eq!(
            spans,
            vec![
                Inline::Text("a ".to_string()),
                Inline::Strong("bold".to_string()),
                Inline::Text(" and ".to_string()),
                Inline::Emphasis("soft".to_string()),
                Inline::Text(" word".to_string()),
            ]
        );
    }

    #[test]
    fn underscore_markers() {
        let spans = parse_inlines("__strong__ and _em_");
        assert_eq!(
            spans,
            vec![
                Inline::Strong("strong".to_string()),
                Inline::Text(" and ".to_string()),
                Inline::Emphasis("em".to_string()),
            ]
        );
    }

    #[test]
    fn unterminated_markers_stay_literal() {
        let spans = parse_inlines("2 ** 3 is `eight");
        assert_eq!(
            spans,
            vec![Inline::Text("2 ** 3 is `eight".to_string())]
        );
    }

    #[test]
    fn code_spans() {
        let spans = parse_inlines("run `cargo test` now");
        assert_eq!(
            spans,
            vec![
                Inline::Text("run ".to_string()),
                Inline::Code("cargo test".to_string()),
                Inline::Text(" now".to_string()),
            ]
        );
    }

    #[test]
    fn bullet_lists() {
        let doc = parse("- one\n- two\n* three");
        assert_eq!(
            doc.blocks,
            vec![Block::List(vec![
                vec![Inline::Text("one".to_string())],
                vec![Inline::Text("two".to_string())],
                vec![Inline::Text("three".to_string())],
            ])]
        );
    }

    #[test]
    fn fenced_code_block() {
        let doc = parse("```\nlet x = 1;\n```");
        assert_eq!(doc.blocks, vec![Block::CodeBlock("let x = 1;".to_string())]);
    }

    #[test]
    fn unterminated_fence_swallows_rest() {
        let doc = parse("```\nlet x = 1;");
        assert_eq!(doc.blocks, vec![Block::CodeBlock("let x = 1;".to_string())]);
    }

    #[test]
    fn paragraph_lines_joined() {
        let doc = parse("one\ntwo\n\nthree");
        assert_eq!(
            doc.blocks,
            vec![
                Block::Paragraph(vec![Inline::Text("one two".to_string())]),
                Block::Paragraph(vec![Inline::Text("three".to_string())]),
            ]
        );
    }

    #[test]
    fn rendering_is_idempotent() {
        let text = "# Hi\n\n- a **b**\n- `c`\n\npara *d*";
        assert_eq!(render(text, true), render(text, true));
        assert_eq!(render(text, false), render(text, false));
    }

    #[test]
    fn plain_rendering_strips_markers() {
        assert_eq!(render("**bold** and `code`", false), "bold and code\n");
    }

    #[test]
    fn styled_rendering_wraps_spans() {
        let out = render("**bold**", true);
        assert_eq!(out, format!("{ANSI_BOLD}bold{ANSI_RESET}\n"));
    }
}
