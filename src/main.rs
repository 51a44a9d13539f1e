use clap::Parser;
use log::info;
use pagesmith::watch::{self, WatchExit};
use pagesmith::{config, output, tasks};
use std::path::Path;

#[derive(Parser)]
#[command(name = "pagesmith")]
#[command(version)]
#[command(about = "Static-site asset pipeline with a live-reload dev server")]
#[command(long_about = "\
Static-site asset pipeline with a live-reload dev server

Run from the project root. Without arguments, builds for production:
stylesheets are compiled, prefixed and minified, pages are rendered,
minified and gzip-compressed into public/.

With `watch`, builds for development, serves public/ on port 4444 and
rebuilds whatever source file changes, reloading connected browsers.

Project layout:

  pipeline.toml            # Tool settings (optional, all keys have defaults)
  pages/
  ├── _default.toml        # Site-wide template values; must set `lang`
  ├── _en.toml             # Translations, one table per language
  ├── mac.html             # Page template → public/mac.html
  └── mac.toml             # Per-page overrides (optional)
  style/
  ├── style.scss           # → public/style.css
  ├── _fonts.css           # Inlined into every page as `inline_fonts_style`
  └── _mixins.scss         # Partial, imported only
  js/
  └── app.js               # Copied to public/app.js in watch mode

Files starting with `_` or an uppercase letter are partials and never
produce output. Set RUST_LOG=debug for per-file detail.")]
struct Cli {
    /// `watch` starts the dev server; anything else runs a production build
    mode: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let dev = cli.mode.as_deref() == Some("watch");

    let project = config::Project::load(Path::new("."))?;
    let site = project.load_site_config(dev)?;
    init_thread_pool(&project.config.processing);

    if dev {
        let runtime = tokio::runtime::Runtime::new()?;
        match runtime.block_on(watch::run(project, site))? {
            WatchExit::ConfigChanged => info!("{} changed, exiting", config::PIPELINE_CONFIG_FILE),
            WatchExit::Interrupted => {}
        }
        return Ok(());
    }

    let output_dir = project.output_dir();
    tasks::run_tasks(tasks::BUILD, &project, &site, |_, report| {
        output::print_task_report(report)
    })?;
    println!("==> Build complete: {}", output_dir.display());
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
