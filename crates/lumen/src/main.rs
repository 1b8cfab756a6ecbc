// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lumen - AI image generation gateway and client.
//!
//! This is the binary entry point: `lumen serve` runs the gateway, the other
//! subcommands act as its client and manage the local image gallery.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod download;
mod gallery;
mod generate;
mod serve;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lumen_config::LumenConfig;
use lumen_core::LumenError;

/// Lumen - AI image generation gateway and client.
#[derive(Parser, Debug)]
#[command(name = "lumen", version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output from the client commands.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway.
    Serve,
    /// Generate images from a text prompt.
    Generate {
        prompt: String,
        #[arg(long, default_value = "1024x1024")]
        size: String,
        #[arg(long, default_value_t = 1)]
        count: i64,
        #[arg(long, default_value = "realistic")]
        style: String,
        /// Retry failed attempts up to the configured limit.
        #[arg(long)]
        retry: bool,
    },
    /// Generate images from a reference image and a prompt.
    Edit {
        /// Path to the reference image.
        image: PathBuf,
        prompt: String,
        /// How far to move away from the reference, 0.0 to 1.0.
        #[arg(long, default_value_t = 0.7)]
        strength: f64,
        #[arg(long, default_value = "1024x1024")]
        size: String,
        #[arg(long, default_value_t = 1)]
        count: i64,
        #[arg(long, default_value = "realistic")]
        style: String,
        #[arg(long)]
        retry: bool,
    },
    /// Rewrite a prompt into a more detailed one.
    Optimize {
        prompt: String,
        #[arg(long, default_value = "realistic")]
        style: String,
    },
    /// Browse and manage locally stored images.
    Gallery {
        #[command(subcommand)]
        action: GalleryCommands,
    },
    /// List the available styles.
    Styles,
    /// Show whether the gateway is running.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
}

#[derive(Subcommand, Debug)]
enum GalleryCommands {
    /// List stored images, newest first.
    List {
        /// Only images whose prompt contains this text.
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        json: bool,
    },
    /// Toggle the favorite flag of an image.
    Favorite { id: String },
    /// Delete an image.
    Delete { id: String },
    /// Save an image to disk as ai-image-<timestamp>.png.
    Download {
        id: String,
        /// Target directory (default: current directory).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show storage statistics.
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Delete every stored image and favorite.
    Clear {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
    /// Print a summary whenever the gallery changes, until Ctrl+C.
    Watch {
        #[arg(long)]
        search: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            lumen_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let Some(command) = cli.command else {
        println!("lumen: use --help for available commands");
        return;
    };

    if !matches!(command, Commands::Serve) {
        serve::init_tracing(if cli.verbose { "debug" } else { "warn" });
    }

    if let Err(e) = run(command, config).await {
        report_error(&e);
        std::process::exit(1);
    }
}

fn load_config(
    path: Option<&std::path::Path>,
) -> Result<LumenConfig, Vec<lumen_config::ConfigError>> {
    match path {
        Some(path) => lumen_config::load_and_validate_path(path),
        None => lumen_config::load_and_validate(),
    }
}

async fn run(command: Commands, config: LumenConfig) -> Result<(), LumenError> {
    match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Generate {
            prompt,
            size,
            count,
            style,
            retry,
        } => {
            let request = lumen_core::types::GenerateRequest {
                prompt,
                size,
                count,
                style,
            };
            generate::run_generate(&config, request, retry).await
        }
        Commands::Edit {
            image,
            prompt,
            strength,
            size,
            count,
            style,
            retry,
        } => {
            let form = generate::EditArgs {
                image,
                prompt,
                strength,
                size,
                count,
                style,
            };
            generate::run_edit(&config, form, retry).await
        }
        Commands::Optimize { prompt, style } => {
            generate::run_optimize(&config, &prompt, &style).await
        }
        Commands::Gallery { action } => match action {
            GalleryCommands::List { search, page, json } => {
                gallery::run_list(&config, search.as_deref(), page, json).await
            }
            GalleryCommands::Favorite { id } => gallery::run_favorite(&config, &id).await,
            GalleryCommands::Delete { id } => gallery::run_delete(&config, &id).await,
            GalleryCommands::Download { id, out } => {
                download::run_download(&config, &id, out.as_deref()).await
            }
            GalleryCommands::Stats { json } => gallery::run_stats(&config, json).await,
            GalleryCommands::Clear { yes } => gallery::run_clear(&config, yes).await,
            GalleryCommands::Watch { search } => {
                gallery::run_watch(&config, search.as_deref()).await
            }
        },
        Commands::Styles => {
            gallery::print_styles();
            Ok(())
        }
        Commands::Status { json, plain } => status::run_status(&config, json, plain).await,
    }
}

fn report_error(err: &LumenError) {
    eprintln!("error: {}", err.user_message());
    if let Some(details) = err.details() {
        eprintln!("  {details}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the stats epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_with_defaults() {
        let cli = Cli::try_parse_from(["lumen", "generate", "a cat"]).unwrap();
        match cli.command {
            Some(Commands::Generate {
                prompt,
                size,
                count,
                style,
                retry,
            }) => {
                assert_eq!(prompt, "a cat");
                assert_eq!(size, "1024x1024");
                assert_eq!(count, 1);
                assert_eq!(style, "realistic");
                assert!(!retry);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_gallery_list_options() {
        let cli = Cli::try_parse_from([
            "lumen", "gallery", "list", "--search", "cat", "--page", "3",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Gallery {
                action: GalleryCommands::List { search, page, json },
            }) => {
                assert_eq!(search.as_deref(), Some("cat"));
                assert_eq!(page, 3);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_gallery_download_target() {
        let cli = Cli::try_parse_from(["lumen", "gallery", "download", "img_1", "--out", "pics"])
            .unwrap();
        match cli.command {
            Some(Commands::Gallery {
                action: GalleryCommands::Download { id, out },
            }) => {
                assert_eq!(id, "img_1");
                assert_eq!(out, Some(PathBuf::from("pics")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_edit_with_strength() {
        let cli = Cli::try_parse_from([
            "lumen",
            "edit",
            "ref.png",
            "make it snowy",
            "--strength",
            "0.4",
            "--count",
            "2",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Edit {
                image,
                strength,
                count,
                ..
            }) => {
                assert_eq!(image, PathBuf::from("ref.png"));
                assert_eq!(strength, 0.4);
                assert_eq!(count, 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = lumen_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.server.port, LumenConfig::default().server.port);
    }
}
