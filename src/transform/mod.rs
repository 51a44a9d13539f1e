//! Asset transforms, all pure Rust.
//!
//! | Transform | Crate / function |
//! |---|---|
//! | **Sass → CSS** | `grass::from_path` |
//! | **Vendor prefixes** | `lightningcss` with browserslist targets |
//! | **Image inlining** | `url(...)` rewrite to `data:` URIs (`regex` + `base64`) |
//! | **CSS minification** | `lightningcss` printer, no URL rebasing |
//! | **HTML minification** | `minify-html` (embedded CSS/JS included) |
//! | **Compression** | `zopfli` gzip |
//!
//! Apart from Sass entry points and inlined images, which are read from disk,
//! every function works on in-memory text or bytes. Writing outputs is left to
//! the pipelines ([`crate::style`], [`crate::pages`], [`crate::compress`]).

pub mod css;
pub mod gzip;
pub mod html;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Sass compile error: {0}")]
    Sass(String),
    #[error("CSS processing error: {0}")]
    Css(String),
}

pub use css::{InlineReport, compile_scss, inline_images, process_css};
pub use gzip::gzip;
pub use html::{HtmlMinifyOptions, minify_html};
