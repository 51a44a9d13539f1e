//! Template rendering.
//!
//! Pages are Jinja-style templates rendered with [minijinja]. The engine is set
//! up strictly:
//!
//! - **Strict undefined**: referencing a variable the config does not define is
//!   an error, never an empty string. A typo in a page must fail the build.
//! - **Trim blocks**: the newline after a `{% ... %}` tag is dropped, so control
//!   blocks on their own lines leave no blank lines behind.
//! - **Auto-escaping** follows the template name: `.html` pages escape
//!   interpolations; use `| safe` for the inlined stylesheets.
//!
//! Translation is exposed twice so both spellings work:
//!
//! ```jinja
//! <h1>{{ "greeting" | t }}</h1>
//! <p>{{ t("download") }}</p>
//! ```
//!
//! Both are bound to the [`LocaleTable`] of the page's language for the
//! duration of one render.

use crate::locale::LocaleTable;
use crate::resolve::ResolvedPageConfig;
use log::error;
use minijinja::{Environment, UndefinedBehavior, Value};
use std::sync::Arc;
use thiserror::Error;

/// Name of the translation filter and function.
pub const TRANSLATE: &str = "t";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("template error in {name}: {source}")]
    Template {
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Per-render inputs besides the configuration.
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Template name used in error messages and for auto-escape detection.
    pub name: String,
    /// Strings for the page's language.
    pub locale: Arc<LocaleTable>,
}

/// Build an environment with the translation filter bound to `locale`.
pub fn environment(locale: Arc<LocaleTable>) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_trim_blocks(true);

    let filter_locale = Arc::clone(&locale);
    env.add_filter(TRANSLATE, move |key: String| -> String {
        filter_locale.translate(&key).to_string()
    });
    env.add_function(TRANSLATE, move |key: String| -> String {
        locale.translate(&key).to_string()
    });
    env
}

/// Render `source` with the resolved config as template context.
///
/// On failure the full error, including the template excerpt, is logged before
/// it is returned.
pub fn render(
    source: &str,
    config: &ResolvedPageConfig,
    ctx: &RenderContext,
) -> Result<String, RenderError> {
    let env = environment(Arc::clone(&ctx.locale));
    let values = Value::from_serialize(template_props(config.props()));
    env.render_named_str(&ctx.name, source, values)
        .map_err(|source| {
            error!("{}: {:#}", ctx.name, source);
            error!("{}", source.display_debug_info());
            RenderError::Template {
                name: ctx.name.clone(),
                source,
            }
        })
}

/// TOML datetimes serialize as a private wrapper struct; templates see their text form.
fn template_props(props: &toml::Table) -> toml::Table {
    props
        .iter()
        .map(|(key, value)| (key.clone(), template_value(value)))
        .collect()
}

fn template_value(value: &toml::Value) -> toml::Value {
    match value {
        toml::Value::Datetime(dt) => toml::Value::String(dt.to_string()),
        toml::Value::Array(items) => toml::Value::Array(items.iter().map(template_value).collect()),
        toml::Value::Table(table) => toml::Value::Table(template_props(table)),
        other => other.clone(),
    }
}
