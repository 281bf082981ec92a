//! Plain-text output for terminal previews

use pulldown_cmark::{Event, Tag, TagEnd};

const RULE: &str = "----------";

/// Line-oriented writer folding Markdown events into plain text
#[derive(Debug, Default)]
pub(crate) struct TextWriter {
    out: String,
    /// Open lists; `Some(n)` is the next number of an ordered list
    lists: Vec<Option<u64>>,
    quote_depth: usize,
    in_heading: Option<u8>,
    in_code_block: bool,
    cell_index: usize,
    mid_line: bool,
}

impl TextWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    for line in text.split_inclusive('\n') {
                        self.push("    ");
                        self.push(line.trim_end_matches('\n'));
                        if line.ends_with('\n') {
                            self.newline();
                        }
                    }
                } else {
                    self.push(&text);
                }
            }
            Event::Code(code) => self.push(&code),
            Event::Html(raw) | Event::InlineHtml(raw) => self.push(&raw),
            Event::SoftBreak | Event::HardBreak => self.newline(),
            Event::Rule => {
                self.end_line();
                self.push(RULE);
                self.blank_line();
            }
            Event::TaskListMarker(checked) => self.push(if checked { "[x] " } else { "[ ] " }),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.end_line();
                self.in_heading = Some(level as u8);
            }
            Tag::List(start) => {
                self.end_line();
                self.lists.push(start);
            }
            Tag::Item => {
                self.end_line();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "- ".to_string(),
                };
                self.push(&format!("{indent}{marker}"));
            }
            Tag::BlockQuote { .. } => {
                self.end_line();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(_) => {
                self.end_line();
                self.in_code_block = true;
            }
            Tag::TableHead | Tag::TableRow => {
                self.end_line();
                self.cell_index = 0;
            }
            Tag::TableCell => {
                if self.cell_index > 0 {
                    self.push(" | ");
                }
                self.cell_index += 1;
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                let width = self
                    .out
                    .rsplit('\n')
                    .next()
                    .map_or(0, |line| line.chars().count());
                let underline = if self.in_heading == Some(1) { '=' } else { '-' };
                self.newline();
                self.push(&underline.to_string().repeat(width));
                self.in_heading = None;
                self.blank_line();
            }
            TagEnd::Paragraph | TagEnd::Table => self.blank_line(),
            TagEnd::Item | TagEnd::TableHead | TagEnd::TableRow => self.end_line(),
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank_line();
                } else {
                    self.end_line();
                }
            }
            TagEnd::BlockQuote { .. } => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blank_line();
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.blank_line();
            }
            _ => {}
        }
    }

    fn push(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.mid_line && self.quote_depth > 0 {
            self.out.push_str(&"> ".repeat(self.quote_depth));
        }
        self.out.push_str(text);
        self.mid_line = true;
    }

    fn newline(&mut self) {
        self.out.push('\n');
        self.mid_line = false;
    }

    fn end_line(&mut self) {
        if self.mid_line {
            self.newline();
        }
    }

    fn blank_line(&mut self) {
        if self.out.is_empty() {
            return;
        }
        self.end_line();
        if !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    pub(crate) fn finish(self) -> String {
        let trimmed = self.out.trim_end();
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("{trimmed}\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulldown_cmark::Parser;

    fn text(source: &str) -> String {
        let mut writer = TextWriter::new();
        for event in Parser::new(source) {
            writer.event(event);
        }
        writer.finish()
    }

    #[test]
    fn block_quote_is_prefixed() {
        assert_eq!(text("> quoted clause\n"), "> quoted clause\n");
    }

    #[test]
    fn code_block_is_indented() {
        assert_eq!(text("```\nlet x = 1;\n```\n"), "    let x = 1;\n");
    }

    #[test]
    fn nested_list_is_indented() {
        assert_eq!(text("- a\n  - b\n- c\n"), "- a\n  - b\n- c\n");
    }

    #[test]
    fn second_level_heading_uses_dashes() {
        assert_eq!(text("## Terms\n"), "Terms\n-----\n");
    }
}
