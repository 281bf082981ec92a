//! Composer Render - document display
//!
//! Generated contracts are markup-flavored plain text (Markdown). This crate
//! turns that text into something displayable without ever touching the
//! source string:
//!
//! - **HTML** for rich previews ([`DocumentRenderer::render_html`])
//! - **Plain text** for terminals ([`DocumentRenderer::render_text`])
//! - **Outline** of headings for navigation ([`DocumentRenderer::outline`])
//!
//! Every function here is pure: the same content always renders identically.
//! The raw view borrows the content unchanged, so toggling between editing and
//! previewing is lossless.
//!
//! # Example
//!
//! ```rust
//! use composer_render::{render, DisplayMode, DocumentRenderer};
//!
//! let content = "# Agreement\n\nThis **Agreement** is made...";
//! assert!(render(content).contains("<h1>Agreement</h1>"));
//!
//! let renderer = DocumentRenderer::new();
//! assert_eq!(renderer.display(content, DisplayMode::Raw), content);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod renderer;
mod text;

pub use renderer::{render, DisplayMode, DocumentRenderer, Heading, RenderOptions};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
