//! HTML minification.
//!
//! The option set mirrors the classic `html-minifier` switches so page builds
//! read the same as they always did. The `minify-html` backend applies most of
//! them unconditionally; the table below records how each one maps.
//!
//! | Option | Backend behaviour |
//! |---|---|
//! | `minify_css` | `Cfg::minify_css` |
//! | `minify_js` | `Cfg::minify_js` |
//! | `remove_optional_tags` | clears `keep_closing_tags` and `keep_html_and_head_opening_tags` |
//! | `collapse_whitespace` + `conservative_collapse` | always on; single separating spaces are kept |
//! | `collapse_boolean_attributes` | always on |
//! | `decode_entities` | always on (shortest entity form) |
//! | `remove_attribute_quotes` | always on where valid |
//! | `remove_script_type_attributes` | always on for JavaScript types |
//! | `remove_style_link_type_attributes` | always on for `text/css` |
//! | `sort_attributes`, `sort_class_name` | not supported; recorded but ignored |
//!
//! Only the first three rows are switches; the rest describe fixed behaviour.

use minify_html::Cfg;

/// HTML minifier switches.
///
/// Only `minify_css`, `minify_js` and `remove_optional_tags` reach the
/// backend. The remaining fields are informational: they record the page
/// build's option set, but the backend's behaviour for them is fixed (see the
/// module table), so clearing one does not change the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HtmlMinifyOptions {
    pub minify_css: bool,
    pub minify_js: bool,
    pub remove_optional_tags: bool,
    /// Informational; always on.
    pub collapse_whitespace: bool,
    /// Informational; always on.
    pub conservative_collapse: bool,
    /// Informational; always on.
    pub collapse_boolean_attributes: bool,
    /// Informational; always on.
    pub decode_entities: bool,
    /// Informational; always on.
    pub remove_attribute_quotes: bool,
    /// Informational; always on.
    pub remove_script_type_attributes: bool,
    /// Informational; always on.
    pub remove_style_link_type_attributes: bool,
    /// Informational; unsupported.
    pub sort_attributes: bool,
    /// Informational; unsupported.
    pub sort_class_name: bool,
}

impl HtmlMinifyOptions {
    /// Everything on, as used for production page builds.
    pub fn production() -> Self {
        Self {
            minify_css: true,
            minify_js: true,
            remove_optional_tags: true,
            collapse_whitespace: true,
            conservative_collapse: true,
            collapse_boolean_attributes: true,
            decode_entities: true,
            remove_attribute_quotes: true,
            remove_script_type_attributes: true,
            remove_style_link_type_attributes: true,
            sort_attributes: true,
            sort_class_name: true,
        }
    }

    fn to_cfg(self) -> Cfg {
        let mut cfg = Cfg::default();
        cfg.minify_css = self.minify_css;
        cfg.minify_js = self.minify_js;
        cfg.keep_closing_tags = !self.remove_optional_tags;
        cfg.keep_html_and_head_opening_tags = !self.remove_optional_tags;
        cfg.keep_comments = false;
        cfg
    }
}

/// Minify a rendered page.
pub fn minify_html(html: &str, options: HtmlMinifyOptions) -> Vec<u8> {
    minify_html::minify(html.as_bytes(), &options.to_cfg())
}
