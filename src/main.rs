use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use tagboard::cli::{self, OutputFormat, ViewOptions};

#[derive(Debug, Parser)]
#[command(name = "tagboard")]
#[command(about = "Tag counts, categories and charts for JSONL files")]
#[command(version)]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the interactive dashboard
    Web {
        /// Listen address (default from config: 127.0.0.1:9747)
        #[arg(long)]
        addr: Option<String>,
        /// Do not open a browser
        #[arg(long)]
        no_open: bool,
    },
    /// Print tag counts for JSONL files or directories
    Summary {
        /// Files or directories (default: [ingest] path from config)
        inputs: Vec<PathBuf>,
        #[command(flatten)]
        view: ViewOptions,
        /// User whose categories and settings apply
        #[arg(long)]
        user: Option<String>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// List the raw (file, tag) entries instead of counts
        #[arg(long)]
        entries: bool,
    },
    /// Render the chart to a PNG file
    Chart {
        /// Files or directories (default: [ingest] path from config)
        inputs: Vec<PathBuf>,
        #[command(flatten)]
        view: ViewOptions,
        #[arg(long)]
        user: Option<String>,
        /// Output PNG path
        #[arg(short, long, default_value = "tag_chart.png")]
        output: PathBuf,
    },
    /// Show or edit a user's tag categories
    Categories {
        #[command(subcommand)]
        action: CategoriesAction,
    },
    /// Show or edit a user's chart settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Push the current counts to the spreadsheet mirror
    Mirror {
        /// Files or directories (default: [ingest] path from config)
        inputs: Vec<PathBuf>,
        #[command(flatten)]
        view: ViewOptions,
        #[arg(long)]
        user: Option<String>,
    },
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum CategoriesAction {
    /// List categories (for the tags in the inputs, if given)
    Show {
        inputs: Vec<PathBuf>,
        #[arg(long)]
        user: Option<String>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Assign a tag to a category
    Set {
        tag: String,
        category: String,
        #[arg(long)]
        user: Option<String>,
    },
    /// Apply a Tag,Category CSV to the tags found in the inputs
    Edit {
        /// CSV file with a header row and Tag,Category columns
        #[arg(long)]
        from: PathBuf,
        inputs: Vec<PathBuf>,
        #[arg(long)]
        user: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum SettingsAction {
    /// Show the chart settings in effect
    Show {
        #[arg(long)]
        user: Option<String>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Update settings, e.g. `width=1024 style_preset=Bold`
    Set {
        #[arg(required = true)]
        pairs: Vec<String>,
        #[arg(long)]
        user: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default config to ~/.tagboard/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set one key in the global config, e.g. `mirror.enabled true`
    Set { key: String, value: String },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let app = App::parse();

    match app.command {
        Commands::Web { addr, no_open } => cli::run_web(addr.as_deref(), no_open),
        Commands::Summary {
            inputs,
            view,
            user,
            format,
            entries,
        } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            if entries {
                cli::run_entries(&inputs, fmt)
            } else {
                cli::run_summary(&inputs, &view, user.as_deref(), fmt)
            }
        }
        Commands::Chart {
            inputs,
            view,
            user,
            output,
        } => cli::run_chart(&inputs, &view, user.as_deref(), &output),
        Commands::Categories { action } => match action {
            CategoriesAction::Show {
                inputs,
                user,
                format,
            } => {
                let fmt = OutputFormat::from_str_opt(Some(&format));
                cli::run_categories_show(&inputs, user.as_deref(), fmt)
            }
            CategoriesAction::Set {
                tag,
                category,
                user,
            } => cli::run_categories_set(user.as_deref(), &tag, &category),
            CategoriesAction::Edit { from, inputs, user } => {
                cli::run_categories_edit(&inputs, user.as_deref(), &from)
            }
        },
        Commands::Settings { action } => match action {
            SettingsAction::Show { user, format } => {
                let fmt = OutputFormat::from_str_opt(Some(&format));
                cli::run_settings_show(user.as_deref(), fmt)
            }
            SettingsAction::Set { pairs, user } => cli::run_settings_set(user.as_deref(), &pairs),
        },
        Commands::Mirror { inputs, view, user } => {
            cli::run_mirror(&inputs, &view, user.as_deref())
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
        },
    }
}
