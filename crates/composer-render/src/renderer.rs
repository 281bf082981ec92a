//! Markdown renderer
//!
//! Uses pulldown-cmark for parsing and HTML output.

use crate::text::TextWriter;
use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// How a document is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Source text, verbatim (edit view)
    Raw,
    /// Rendered HTML (preview)
    #[default]
    Html,
    /// Rendered plain text (terminal preview)
    Text,
}

/// Renderer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Escape raw HTML found in the content instead of passing it through
    pub escape_html: bool,
    /// GitHub-style tables
    pub tables: bool,
    /// `~~strikethrough~~`
    pub strikethrough: bool,
    /// `- [ ]` task list markers
    pub tasklists: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            escape_html: true,
            tables: true,
            strikethrough: true,
            tasklists: true,
        }
    }
}

/// Document heading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading level (1-6)
    pub level: u8,
    /// Heading text
    pub text: String,
}

/// Stateless document renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentRenderer {
    options: RenderOptions,
}

impl DocumentRenderer {
    /// Create renderer with default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With options
    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Get options
    #[inline]
    #[must_use]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    fn parser<'a>(&self, content: &'a str) -> Parser<'a> {
        let mut options = Options::empty();
        if self.options.tables {
            options.insert(Options::ENABLE_TABLES);
        }
        if self.options.strikethrough {
            options.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.options.tasklists {
            options.insert(Options::ENABLE_TASKLISTS);
        }
        Parser::new_ext(content, options)
    }

    /// Render content to an HTML fragment
    #[must_use]
    pub fn render_html(&self, content: &str) -> String {
        let mut out = String::with_capacity(content.len() + content.len() / 2);
        let parser = self.parser(content);

        if self.options.escape_html {
            html::push_html(&mut out, parser.map(escape_raw_html));
        } else {
            html::push_html(&mut out, parser);
        }
        out
    }

    /// Render content to plain text for terminals
    #[must_use]
    pub fn render_text(&self, content: &str) -> String {
        let mut writer = TextWriter::new();
        for event in self.parser(content) {
            writer.event(event);
        }
        writer.finish()
    }

    /// Heading hierarchy of the content, in document order
    #[must_use]
    pub fn outline(&self, content: &str) -> Vec<Heading> {
        let mut headings = Vec::new();
        let mut current: Option<Heading> = None;

        for event in self.parser(content) {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    current = Some(Heading {
                        level: level as u8,
                        text: String::new(),
                    });
                }
                Event::Text(text) | Event::Code(text) => {
                    if let Some(ref mut heading) = current {
                        heading.text.push_str(&text);
                    }
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(heading) = current.take() {
                        headings.push(heading);
                    }
                }
                _ => {}
            }
        }

        headings
    }

    /// Display content in the given mode
    ///
    /// `Raw` borrows the content unchanged.
    #[must_use]
    pub fn display<'a>(&self, content: &'a str, mode: DisplayMode) -> Cow<'a, str> {
        match mode {
            DisplayMode::Raw => Cow::Borrowed(content),
            DisplayMode::Html => Cow::Owned(self.render_html(content)),
            DisplayMode::Text => Cow::Owned(self.render_text(content)),
        }
    }
}

/// Render content to HTML with default options
#[must_use]
pub fn render(content: &str) -> String {
    DocumentRenderer::new().render_html(content)
}

fn escape_raw_html(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    }
}
