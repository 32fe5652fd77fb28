//! slashkey - command-line front end for the expansion engine.
//!
//! Runs text through a headless page so mappings can be tried and the
//! store maintained without a browser.
//!
//! ```bash
//! slashkey expand "Thanks, /sig"
//! slashkey suggest fo
//! slashkey set sig "Best regards"
//! slashkey check
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use slashkey::config::{self, Config};
use slashkey::expand_manager::{ExpandManager, Key, KeyEvent, Modifiers};
use slashkey::field::{utf16, PlainEditable};
use slashkey::logging;
use slashkey::page::{DomPoint, Page, RichTextBlock, TextNode};
use slashkey::store::{JsonFileStore, MappingStore, MappingStoreClient};
use slashkey::suggest::filter_keywords;

/// Expansions slower than this are logged as warnings
const SLOW_EXPAND_MS: u64 = 50;

const WATCH_POLL: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "slashkey")]
#[command(about = "Inline /keyword text expansion")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.slashkey/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Mapping store file, overrides the config's storePath
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand the /keyword at the caret and print the resulting text
    #[command(after_help = "\
Examples:
  slashkey expand 'Thanks, /sig'
  slashkey expand 'see /fo later' --caret 7 --keyword foo
  slashkey expand 'Hello /sig' --rich")]
    Expand {
        text: String,

        /// Caret offset in UTF-16 units (default: end of text)
        #[arg(long)]
        caret: Option<usize>,

        /// Pick this suggestion instead of committing the typed keyword
        #[arg(long, short = 'k')]
        keyword: Option<String>,

        /// Use a rich-text field instead of a plain textarea
        #[arg(long)]
        rich: bool,
    },

    /// Print the keywords suggested for a partial keyword
    Suggest {
        /// Text typed after the slash
        #[arg(default_value = "")]
        partial: String,
    },

    /// Add or replace a mapping
    Set { keyword: String, phrase: String },

    /// Delete a mapping
    Remove { keyword: String },

    /// Validate the configuration, then load the store and report what it
    /// contains
    Check,

    /// Reload and report whenever the store file changes
    Watch,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init();

    let config = match &cli.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    };
    let store_path = cli.store.clone().unwrap_or_else(|| config.store_path());
    debug!(store = %store_path.display(), "Using mapping store");
    let store = Arc::new(JsonFileStore::new(store_path));

    match cli.command {
        Commands::Expand {
            text,
            caret,
            keyword,
            rich,
        } => {
            let start = Instant::now();
            let expanded = expand(config, store, &text, caret, keyword.as_deref(), rich)?;
            logging::log_perf("expand", start.elapsed().as_millis() as u64, SLOW_EXPAND_MS);
            println!("{expanded}");
        }
        Commands::Suggest { partial } => {
            let table = store.get_all().context("failed to read mapping store")?;
            for keyword in filter_keywords(table.keywords(), &partial) {
                println!("/{keyword}");
            }
        }
        Commands::Set { keyword, phrase } => {
            store
                .set(&keyword, &phrase)
                .with_context(|| format!("failed to save '/{keyword}'"))?;
            println!("saved /{}", keyword.trim());
        }
        Commands::Remove { keyword } => {
            if !store.remove(&keyword).context("failed to update mapping store")? {
                bail!("no mapping for '/{keyword}'");
            }
            println!("removed /{keyword}");
        }
        Commands::Check => {
            let selectors = config.try_selectors().context("invalid configuration")?;
            debug!(?selectors, "Editable selectors are valid");
            let table = store.get_all().with_context(|| {
                format!("mapping store {} is unusable", store.path().display())
            })?;
            println!("{}: {} mappings", store.path().display(), table.len());
        }
        Commands::Watch => watch(store)?,
    }

    Ok(())
}

/// Type `text` into a headless field, let the engine refresh, then commit
fn expand(
    config: Config,
    store: Arc<JsonFileStore>,
    text: &str,
    caret: Option<usize>,
    keyword: Option<&str>,
    rich: bool,
) -> Result<String> {
    let (client, _subscription) = MappingStoreClient::connect(store);
    if !client.is_loaded() {
        bail!("mapping store could not be loaded");
    }
    let chord = Modifiers::from(config.commit_modifier);

    let mut page = Page::new();
    let id = if rich {
        page.add_contenteditable(RichTextBlock::new(vec![TextNode::plain(text)]))
    } else {
        page.add_textarea(text)
    };
    if let Some(caret) = caret.map(|c| c.min(utf16::len(text))) {
        if let Some(control) = page.plain_mut(id) {
            control.set_selection_range(caret, caret);
        }
        if let Some(block) = page.rich_mut(id) {
            block.set_caret(Some(DomPoint {
                node: 0,
                offset: caret,
            }));
        }
    }
    page.focus(id);

    let mut manager = ExpandManager::new(config, client);
    manager.adopt_active_element(&mut page);
    manager.input(id, Instant::now());
    if let Some(deadline) = manager.next_deadline() {
        manager.poll(&mut page, deadline);
    }

    match keyword {
        Some(keyword) => {
            let keyword = keyword.trim_start_matches('/');
            let index = manager
                .suggestions()
                .items()
                .iter()
                .position(|candidate| candidate == keyword)
                .with_context(|| format!("'/{keyword}' is not suggested at the caret"))?;
            manager.suggestion_click(&mut page, index);
        }
        None => {
            let _ = manager.handle_key(&mut page, id, KeyEvent::with_modifiers(Key::Enter, chord));
        }
    }

    if manager.stats().commits == 0 {
        bail!("nothing to expand at the caret");
    }
    info!(rich, "Expanded text");
    page.text_of(id).context("field disappeared")
}

fn watch(store: Arc<JsonFileStore>) -> Result<()> {
    store
        .watch()
        .with_context(|| format!("failed to watch {}", store.path().display()))?;
    // The client only holds a weak reference; `store` keeps the watcher alive
    let (client, _subscription) = MappingStoreClient::connect(store.clone());
    let path = store.path().display().to_string();
    println!("watching {path}: {} mappings", client.snapshot().len());

    let mut last = client.snapshot();
    loop {
        std::thread::sleep(WATCH_POLL);
        let current = client.snapshot();
        if !Arc::ptr_eq(&last, &current) {
            println!("{path}: {} mappings", current.len());
            last = current;
        }
    }
}
