//! Stylesheet transforms: Sass compilation, prefixing/minification, image inlining.

use super::TransformError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use log::debug;
use regex::{Captures, Regex};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

/// Matches `url(...)` with double-quoted, single-quoted or bare arguments.
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*(?:"([^"]*)"|'([^']*)'|([^'"()\s]+))\s*\)"#)
        .expect("url pattern must compile")
});

/// Compile a Sass entry file. `@use`/`@import` resolve relative to it.
pub fn compile_scss(path: &Path) -> Result<String, TransformError> {
    grass::from_path(path, &grass::Options::default())
        .map_err(|e| TransformError::Sass(format!("{}: {}", path.display(), e)))
}

fn targets(browsers: &[String]) -> Result<Targets, TransformError> {
    let browsers = Browsers::from_browserslist(browsers.iter().map(String::as_str))
        .map_err(|e| TransformError::Css(format!("invalid browser targets: {e}")))?;
    Ok(Targets {
        browsers,
        ..Targets::default()
    })
}

/// Parse `css`, add the vendor prefixes `browsers` need, and print it back.
///
/// With `minify` the output is compact; without it the output stays readable so
/// later passes (image inlining) can still work on it. URLs are never rebased.
pub fn process_css(
    name: &str,
    css: &str,
    browsers: &[String],
    minify: bool,
) -> Result<String, TransformError> {
    let mut sheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: name.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| TransformError::Css(format!("{name}: {e}")))?;

    sheet
        .minify(MinifyOptions {
            targets: targets(browsers)?,
            ..MinifyOptions::default()
        })
        .map_err(|e| TransformError::Css(format!("{name}: {e}")))?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify,
            targets: targets(browsers)?,
            ..PrinterOptions::default()
        })
        .map_err(|e| TransformError::Css(format!("{name}: {e}")))?;
    Ok(printed.code)
}

/// Result of an inlining pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InlineReport {
    /// References rewritten to data URIs.
    pub inlined: usize,
    /// References left alone because the file was larger than the limit.
    pub too_large: usize,
    /// Local references whose file does not exist under the web root.
    pub missing: usize,
}

/// MIME type for an image extension, or `None` if it is not an inlinable image.
fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "svg" => Some("image/svg+xml"),
        "webp" => Some("image/webp"),
        "avif" => Some("image/avif"),
        "ico" => Some("image/x-icon"),
        _ => None,
    }
}

fn is_remote(url: &str) -> bool {
    url.starts_with("data:") || url.starts_with("//") || url.starts_with('#') || url.contains("://")
}

/// Rewrite `url(...)` references to small local images as base64 data URIs.
///
/// References are resolved against `web_root` whether or not they start with
/// `/`. Query strings and fragments are ignored when locating the file.
/// Remote URLs, existing data URIs, non-image files, missing files and files
/// larger than `max_bytes` are left untouched.
pub fn inline_images(css: &str, web_root: &Path, max_bytes: u64) -> (String, InlineReport) {
    let mut report = InlineReport::default();
    let rewritten = URL_RE.replace_all(css, |caps: &Captures| {
        let original = caps[0].to_string();
        let Some(url) = caps.get(1).or(caps.get(2)).or(caps.get(3)) else {
            return original;
        };
        let url = url.as_str();
        if is_remote(url) {
            return original;
        }
        let local = url.split(['?', '#']).next().unwrap_or(url);
        let path = web_root.join(local.trim_start_matches('/'));
        let Some(mime) = image_mime(&path) else {
            return original;
        };
        let size = match fs::metadata(&path) {
            Ok(meta) => meta.len(),
            Err(_) => {
                debug!("not inlining {url}: {} not found", path.display());
                report.missing += 1;
                return original;
            }
        };
        if size > max_bytes {
            report.too_large += 1;
            return original;
        }
        match fs::read(&path) {
            Ok(bytes) => {
                report.inlined += 1;
                format!("url(\"data:{mime};base64,{}\")", STANDARD.encode(bytes))
            }
            Err(e) => {
                debug!("not inlining {url}: {e}");
                report.missing += 1;
                original
            }
        }
    });
    (rewritten.into_owned(), report)
}
