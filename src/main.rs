use clap::{Parser, Subcommand};
use pagemeta::admin::{LengthReport, SaveRequest};
use pagemeta::config::{self, SiteConfig};
use pagemeta::output;
use pagemeta::resolve::SeoResolver;
use pagemeta::serve::{self, AppState};
use pagemeta::session::SeoAdminSession;
use pagemeta::store::{JsonFileStore, SeoStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "pagemeta")]
#[command(about = "Per-page SEO metadata: resolve, edit, and serve")]
#[command(long_about = "\
Per-page SEO metadata: resolve, edit, and serve

Every public page has compiled-in default metadata. Stored overrides replace
individual fields; anything not overridden falls back to the default.

Resolution (first available wins):
  Title:       stored meta title → page default
  Description: stored meta description → page default
  Keywords:    stored keywords → page default → none

Blank stored titles and descriptions fall through to the default.

Run 'pagemeta gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Path to config.toml (missing file = stock defaults)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Log filter (trace, debug, info, warn, error, or an EnvFilter directive)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the admin listing, the save action, and public pages
    Serve,
    /// List every page with its effective metadata
    List {
        /// Only pages whose label or slug contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Show the effective metadata for one page
    Resolve {
        slug: String,
    },
    /// Write an override for one page to the store
    ///
    /// Only the store is touched. A running server keeps serving its cached
    /// pages until it is revalidated with POST /admin/revalidate.
    Save {
        slug: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Comma-separated; omit or leave blank to use the page default
        #[arg(long)]
        keywords: Option<String>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

/// Loaded config, store, and runtime shared by every command except
/// `gen-config`.
struct Context {
    config: SiteConfig,
    store: Arc<JsonFileStore>,
    runtime: tokio::runtime::Runtime,
}

impl Context {
    fn load(config_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let config = config::load_config(config_path)?;
        let store = Arc::new(JsonFileStore::new(&config.store.path));
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            config,
            store,
            runtime,
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Command::Serve => {
            let ctx = Context::load(&cli.config)?;
            let state = Arc::new(AppState::new(ctx.store, &ctx.config));
            serve::run(state, &ctx.config.serve, ctx.runtime.handle().clone())?;
        }
        Command::List { search } => {
            let ctx = Context::load(&cli.config)?;
            let resolver = SeoResolver::new(ctx.store, &ctx.config);
            let session = ctx
                .runtime
                .block_on(SeoAdminSession::load(&resolver, ctx.config.limits));
            if let Some(error) = session.load_error() {
                eprintln!("{}", output::format_load_error(error));
            }
            let rows = session.filtered(search.as_deref().unwrap_or(""));
            output::print_listing(
                &rows,
                session.page_count(),
                resolver.base_url(),
                &ctx.config.limits,
            );
        }
        Command::Resolve { slug } => {
            let ctx = Context::load(&cli.config)?;
            let resolver = SeoResolver::new(ctx.store, &ctx.config);
            let page = ctx.runtime.block_on(resolver.resolve(&slug))?;
            output::print_resolved(&page, &resolver.canonical_url(&slug)?);
        }
        Command::Save {
            slug,
            title,
            description,
            keywords,
        } => {
            let ctx = Context::load(&cli.config)?;
            let request = SaveRequest {
                slug,
                meta_title: title,
                meta_description: description,
                keywords,
            };
            let entry = ctx.runtime.block_on(ctx.store.save(
                &request.slug,
                &request.meta_title,
                &request.meta_description,
                request.keywords(),
            ))?;
            let lengths = LengthReport::new(
                &request.meta_title,
                &request.meta_description,
                &ctx.config.limits,
            );
            output::print_saved(&entry, &lengths);
            eprintln!(
                "{}",
                output::format_server_cache_note(serve::ADMIN_REVALIDATE_PATH)
            );
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the global tracing subscriber. Logs go to stderr so command
/// output on stdout stays clean.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
