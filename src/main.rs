#![forbid(unsafe_code)]

//! Image Folder Viewer: headless front end
//!
//! Manages cards in a profile from the command line and drives the viewer
//! from stdin, one key per line:
//!
//! ```bash
//! image-folder-viewer new ~/pictures/main
//! image-folder-viewer add ~/pictures/trip --profile ~/pictures/main.ivprofile
//! image-folder-viewer view
//! > right
//! > r
//! > +
//! > q
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

use image_folder_viewer::app::App;
use image_folder_viewer::config::CardPatch;
use image_folder_viewer::constants::config;
use image_folder_viewer::images::{FsImageSource, ImageSource};
use image_folder_viewer::keymap::KeyInput;
use image_folder_viewer::logging;
use image_folder_viewer::persistence::{JsonFilePersistence, PersistenceBridge};
use image_folder_viewer::store::{ProfileStore, default_card_title};
use image_folder_viewer::types::{LogicalSize, Page};
use image_folder_viewer::window::{DialogProvider, HeadlessWindow};

#[derive(Parser)]
#[command(name = "image-folder-viewer")]
#[command(version)]
#[command(about = "Browse folders of images as cards")]
struct Cli {
    /// Log level (trace, debug, info, warn, error). Defaults to $LOG_LEVEL or info.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Directory holding app_config.json
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Profile to use (defaults to the most recently opened one)
    #[arg(short, long, global = true)]
    profile: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new profile (".ivprofile" is appended if missing)
    New { path: PathBuf },

    /// List cards in display order
    Cards,

    /// Add a folder as a card
    Add {
        folder: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        thumbnail: Option<String>,
    },

    /// Change a card's title, folder or thumbnail
    Edit {
        card_id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        folder: Option<String>,
        #[arg(long, conflicts_with = "clear_thumbnail")]
        thumbnail: Option<String>,
        #[arg(long)]
        clear_thumbnail: bool,
    },

    /// Delete a card
    Remove { card_id: String },

    /// Put the named cards first, in this order
    Reorder {
        #[arg(required = true)]
        card_ids: Vec<String>,
    },

    /// Tag a card, creating the tag if needed
    Tag {
        card_id: String,
        name: String,
        #[arg(long)]
        color: Option<String>,
    },

    /// Show recently opened profiles
    Recent,

    /// Drop a profile from the recent list
    Forget { path: String },

    /// Interactive viewer reading one key per line from stdin.
    /// `open`, `new`, `saveas` and `thumb` take a path in place of a dialog.
    View {
        /// Open this card instead of resuming
        #[arg(long)]
        card: Option<String>,
    },
}

fn persistence(cli: &Cli) -> JsonFilePersistence {
    match &cli.config_dir {
        Some(dir) => JsonFilePersistence::new(dir.join(config::FILENAME)),
        None => JsonFilePersistence::with_default_config(),
    }
}

/// `--profile`, or the most recent profile
fn profile_path<P: PersistenceBridge>(cli: &Cli, store: &ProfileStore<P>) -> Result<PathBuf> {
    if let Some(path) = &cli.profile {
        return Ok(path.clone());
    }
    store
        .recent_profiles()
        .first()
        .map(|recent| PathBuf::from(&recent.path))
        .context("No profile given and no recent profiles (use --profile or `new`)")
}

fn open_store(cli: &Cli) -> Result<ProfileStore<JsonFilePersistence>> {
    let mut store = ProfileStore::new(persistence(cli));
    store.initialize();
    let path = profile_path(cli, &store)?;
    store.open_profile(&path)?;
    Ok(store)
}

fn print_cards<P: PersistenceBridge>(store: &ProfileStore<P>, selection: Option<usize>) {
    let cards = store.cards_with_status();
    if cards.is_empty() {
        println!("(no cards)");
    }
    for (i, status) in cards.iter().enumerate() {
        let marker = if selection == Some(i) { ">" } else { " " };
        let tags: Vec<&str> = store
            .tags_for_card(&status.card.id)
            .into_iter()
            .map(|t| t.name.as_str())
            .collect();
        print!(
            "{marker} {:>3}  {}  {}  {}",
            status.card.sort_order, status.card.id, status.card.title, status.card.folder_path
        );
        if !tags.is_empty() {
            print!("  [{}]", tags.join(", "));
        }
        if let Some(problem) = &status.error_message {
            print!("  ({problem})");
        }
        println!();
    }
}

/// Answers dialogs with the path typed after the key, e.g. `ctrl+n ~/pics`
#[derive(Default)]
struct LineDialogs {
    answer: Option<PathBuf>,
}

impl DialogProvider for LineDialogs {
    fn select_folder(&mut self) -> Option<PathBuf> {
        self.answer.take()
    }
    fn select_image_file(&mut self, _start_dir: Option<&Path>) -> Option<PathBuf> {
        self.answer.take()
    }
    fn select_profile_file(&mut self) -> Option<PathBuf> {
        self.answer.take()
    }
    fn select_save_target(&mut self) -> Option<PathBuf> {
        self.answer.take()
    }
}

type CliApp = App<JsonFilePersistence, FsImageSource, HeadlessWindow>;

fn print_app(app: &mut CliApp) {
    match app.page() {
        Page::Index => {
            println!("== {} ==", app.store().current_profile_name());
            print_cards(app.store(), app.selection());
        }
        Page::Viewer => {
            let nav = app.navigator();
            if let Some(err) = nav.error() {
                println!("{}: {err} (q to go back)", nav.title());
            } else if nav.is_loading() {
                println!("{}: loading...", nav.title());
            } else {
                let state = nav.navigation_state();
                let name = nav.current_image().map(|i| i.filename.as_str()).unwrap_or("-");
                let mut flags = String::new();
                if nav.shuffle_enabled() {
                    flags.push_str(" [R]");
                }
                if nav.h_flip_enabled() {
                    flags.push_str(" [H]");
                }
                println!(
                    "{} [{}/{}] {name}  zoom {:.2}{flags}",
                    nav.title(),
                    state.current_index + 1,
                    state.total_images,
                    app.zoom().zoom_level()
                );
            }
            if app.context_menu_open() {
                println!("  menu: c copy image | p copy path | esc close");
            }
        }
    }
    if let Some(error) = app.store_mut().take_error() {
        eprintln!("error: {error}");
    }
}

fn pump_window(app: &mut CliApp) {
    let events = app.window_mut().take_resize_events();
    for event in events {
        app.on_window_resized(event);
    }
}

fn parse_size(text: &str) -> Option<LogicalSize> {
    let (w, h) = text.split_once('x')?;
    Some(LogicalSize::new(w.trim().parse().ok()?, h.trim().parse().ok()?))
}

/// Feed input lines to the app until EOF, `close`, or `shutdown` resolves.
///
/// `shutdown` is created once by the caller and polled across iterations, so
/// a signal that arrives while a line is handled still ends the loop.
async fn drive_viewer<R: AsyncBufRead + Unpin>(
    app: &mut CliApp,
    input: R,
    shutdown: impl Future<Output = ()>,
) {
    let mut lines = input.lines();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "Failed to read stdin");
                        break;
                    }
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let (token, rest) = match line.split_once(char::is_whitespace) {
                    Some((token, rest)) => (token, Some(rest.trim())),
                    None => (line, None),
                };
                match token {
                    "close" | "exit" => break,
                    "resize" => match rest.and_then(parse_size) {
                        Some(size) => app.window_mut().user_resize(size),
                        None => eprintln!("usage: resize <width>x<height>"),
                    },
                    "goto" => match rest.and_then(|r| r.parse::<usize>().ok()) {
                        Some(n) => app.go_to_image(n.saturating_sub(1)),
                        None => eprintln!("usage: goto <position>"),
                    },
                    "open" | "new" | "saveas" | "thumb" => {
                        let mut dialogs = LineDialogs { answer: rest.map(PathBuf::from) };
                        // Errors land in the store's message field, printed below
                        let _ = match token {
                            "open" => app.open_profile_with_dialog(&mut dialogs),
                            "new" => app.create_profile_with_dialog(&mut dialogs),
                            "saveas" => app.save_profile_as_with_dialog(&mut dialogs),
                            _ => app.choose_thumbnail_with_dialog(&mut dialogs),
                        };
                    }
                    _ => match token.parse::<KeyInput>() {
                        Ok(input) => {
                            let mut dialogs = LineDialogs { answer: rest.map(PathBuf::from) };
                            if !app.handle_key(input, &mut dialogs) {
                                eprintln!("{token}: not bound here");
                            }
                        }
                        Err(e) => eprintln!("{e}"),
                    },
                }
                pump_window(app);
                print_app(app);
            }
            _ = &mut shutdown => {
                println!();
                break;
            }
        }
    }
}

async fn run_viewer(cli: &Cli, card: Option<&str>) -> Result<()> {
    let store = ProfileStore::new(persistence(cli));
    let mut app = App::new(store, FsImageSource, HeadlessWindow::default());
    let path = match &cli.profile {
        Some(path) => {
            app.open_profile(path)?;
            path.clone()
        }
        None => app
            .open_last_profile()
            .context("No recent profile could be opened (use --profile or `new`)")?,
    };
    if let Some(card_id) = card {
        app.open_card(card_id)?;
    }
    pump_window(&mut app);
    print_app(&mut app);

    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };
    drive_viewer(&mut app, tokio::io::BufReader::new(tokio::io::stdin()), interrupted).await;

    app.on_close_requested()?;
    info!(profile = %path.display(), "Viewer closed");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref())?;

    match &cli.command {
        Commands::New { path } => {
            let mut store = ProfileStore::new(persistence(&cli));
            store.initialize();
            store.create_profile(path)?;
            if let Some(created) = store.current_path() {
                println!("Created {}", created.display());
            }
        }

        Commands::Cards => {
            let store = open_store(&cli)?;
            print_cards(&store, None);
        }

        Commands::Add { folder, title, thumbnail } => {
            let mut store = open_store(&cli)?;
            let card = if title.is_none() && thumbnail.is_none() {
                store.add_card_for_folder(folder, &FsImageSource)?
            } else {
                let thumbnail = match thumbnail {
                    Some(t) => Some(t.clone()),
                    None => FsImageSource
                        .first_image(folder)
                        .ok()
                        .flatten()
                        .map(|i| i.path.to_string_lossy().to_string()),
                };
                let title = title.clone().unwrap_or_else(|| default_card_title(folder));
                store.add_card(&folder.to_string_lossy(), &title, thumbnail)?
            };
            store.save_current_profile()?;
            println!("Added {} ({})", card.title, card.id);
        }

        Commands::Edit { card_id, title, folder, thumbnail, clear_thumbnail } => {
            let patch = CardPatch {
                title: title.clone(),
                folder_path: folder.clone(),
                thumbnail: if *clear_thumbnail { Some(None) } else { thumbnail.clone().map(Some) },
            };
            if patch.is_empty() {
                bail!("Nothing to change (use --title, --folder, --thumbnail or --clear-thumbnail)");
            }
            let mut store = open_store(&cli)?;
            let card = store.update_card(card_id, patch)?;
            store.save_current_profile()?;
            println!("Updated {} ({})", card.title, card.id);
        }

        Commands::Remove { card_id } => {
            let mut store = open_store(&cli)?;
            store.delete_card(card_id)?;
            store.save_current_profile()?;
            println!("Removed {card_id}");
        }

        Commands::Reorder { card_ids } => {
            let mut store = open_store(&cli)?;
            store.reorder_cards(card_ids.as_slice())?;
            store.save_current_profile()?;
            print_cards(&store, None);
        }

        Commands::Tag { card_id, name, color } => {
            let mut store = open_store(&cli)?;
            let existing = store
                .current()
                .and_then(|doc| doc.tags.iter().find(|t| &t.name == name))
                .map(|t| t.id.clone());
            let tag_id = match existing {
                Some(id) => id,
                None => store.add_tag(name, color.clone())?.id,
            };
            if store.assign_tag(card_id, &tag_id)? {
                store.save_current_profile()?;
                println!("Tagged {card_id} with {name}");
            } else {
                println!("{card_id} already tagged {name}");
            }
        }

        Commands::Recent => {
            let mut store = ProfileStore::new(persistence(&cli));
            store.initialize();
            if store.recent_profiles().is_empty() {
                println!("(no recent profiles)");
            }
            for recent in store.recent_profiles() {
                println!("{}  {}  {}", recent.last_opened_at, recent.name, recent.path);
            }
        }

        Commands::Forget { path } => {
            let mut store = ProfileStore::new(persistence(&cli));
            store.initialize();
            store.remove_from_history(path)?;
        }

        Commands::View { card } => {
            run_viewer(&cli, card.as_deref()).await?;
        }
    }

    Ok(())
}
