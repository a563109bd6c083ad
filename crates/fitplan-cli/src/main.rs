mod config;
mod export_cmd;
mod generate_cmd;
mod media_cmds;
mod plan_cmds;
mod profile_args;
mod resolve;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use fitplan_core::media::ImageCategory;
use fitplan_store::models::DayKey;

use config::FitplanConfig;
use generate_cmd::GenerateOptions;
use media_cmds::IllustrationTarget;
use profile_args::ProfileArgs;

#[derive(Parser)]
#[command(
    name = "fitplan",
    version,
    about = "Personalized weekly fitness and nutrition plans"
)]
struct Cli {
    /// Saved plan file (overrides FITPLAN_STORE_PATH env var)
    #[arg(long, global = true, value_name = "FILE")]
    store_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a fitplan config file
    Init {
        /// Gemini API key for plan generation
        #[arg(long)]
        gemini_api_key: Option<String>,
        /// Deepgram API key for narration
        #[arg(long)]
        deepgram_api_key: Option<String>,
        /// Stability API key for illustrations
        #[arg(long)]
        stability_api_key: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Config file management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate a 7-day plan for a profile
    Generate {
        #[command(flatten)]
        profile: ProfileArgs,
        /// Save the plan to the plan store
        #[arg(long)]
        save: bool,
        /// Also write the plan document to this file
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Print the plan as JSON instead of a document
        #[arg(long)]
        json: bool,
    },
    /// Saved plan management
    Plans {
        #[command(subcommand)]
        command: PlansCommands,
    },
    /// Export a saved plan as a text document
    Export {
        /// Plan ID, ID prefix, or `latest` (default)
        plan: Option<String>,
        /// Output file (`-` for stdout; default fitness-plan-<Name>.txt)
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Write narration audio for a saved plan
    Narrate {
        /// Plan ID, ID prefix, or `latest` (default)
        plan: Option<String>,
        /// Day to narrate (day1..day7); all days when omitted
        #[arg(long)]
        day: Option<DayKey>,
        /// Directory to write `<day>.mp3` files into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Write illustrations for a day of a saved plan
    Illustrate {
        /// Plan ID, ID prefix, or `latest` (default)
        plan: Option<String>,
        /// Day to illustrate (day1..day7)
        #[arg(long)]
        day: DayKey,
        /// Illustrate only this exercise or meal
        #[arg(long)]
        item: Option<String>,
        /// Category of --item: exercise or meal
        #[arg(long, requires = "item", default_value = "exercise")]
        category: ImageCategory,
        /// Directory to write PNG files into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Serve the generation HTTP API
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 3000)]
        port: u16,
    },
    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Set a value, e.g. `fitplan config set upstream.gemini_api_key KEY`
    Set { key: String, value: String },
    /// Show the resolved configuration (keys are not printed)
    Show,
}

#[derive(Subcommand)]
pub enum PlansCommands {
    /// List saved plans, newest first
    List,
    /// Show a saved plan
    Show {
        /// Plan ID or ID prefix
        plan: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the most recently saved plan
    Latest {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a saved plan
    Delete {
        /// Plan ID or ID prefix
        plan: String,
    },
    /// Save a plan JSON file together with a profile
    Save {
        /// Plan JSON file (day1..day7)
        file: PathBuf,
        #[command(flatten)]
        profile: ProfileArgs,
    },
}

/// Execute the `fitplan init` command: write config file.
fn cmd_init(
    gemini_api_key: Option<String>,
    deepgram_api_key: Option<String>,
    stability_api_key: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        upstream: config::UpstreamSection {
            gemini_api_key,
            deepgram_api_key,
            stability_api_key,
            gemini_model: None,
        },
        store: config::StoreSection {
            path: Some(fitplan_store::StoreConfig::default_path()),
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    for (name, key) in [
        ("upstream.gemini_api_key", &cfg.upstream.gemini_api_key),
        ("upstream.deepgram_api_key", &cfg.upstream.deepgram_api_key),
        ("upstream.stability_api_key", &cfg.upstream.stability_api_key),
    ] {
        let state = if key.is_some() { "set" } else { "not set" };
        println!("  {name} = ({state})");
    }
    if let Some(store) = &cfg.store.path {
        println!("  store.path = {}", store.display());
    }
    println!();
    println!("Missing keys can be added later with `fitplan config set <key> <value>`.");

    Ok(())
}

fn cmd_config_show(store_path: Option<&Path>) -> anyhow::Result<()> {
    let resolved = FitplanConfig::resolve(store_path)?;
    let state = |key: &Option<String>| if key.is_some() { "set" } else { "not set" };

    println!("Config file:   {}", config::config_path().display());
    println!("Store:         {}", resolved.store.path.display());
    println!("Gemini model:  {}", resolved.gemini_model);
    println!("Gemini key:    {}", state(&resolved.credentials.gemini));
    println!("Deepgram key:  {}", state(&resolved.credentials.deepgram));
    println!("Stability key: {}", state(&resolved.credentials.stability));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let store_path = cli.store_path.as_deref();

    match cli.command {
        Commands::Init {
            gemini_api_key,
            deepgram_api_key,
            stability_api_key,
            force,
        } => {
            cmd_init(gemini_api_key, deepgram_api_key, stability_api_key, force)?;
        }
        Commands::Config { command } => match command {
            ConfigCommands::Set { key, value } => {
                let path = config::set_value(&key, &value)?;
                println!("Set {key} in {}", path.display());
            }
            ConfigCommands::Show => cmd_config_show(store_path)?,
        },
        Commands::Generate {
            profile,
            save,
            output,
            json,
        } => {
            let resolved = FitplanConfig::resolve(store_path)?;
            let options = GenerateOptions { save, output, json };
            generate_cmd::run_generate(&resolved, &profile, &options).await?;
        }
        Commands::Plans { command } => {
            let resolved = FitplanConfig::resolve(store_path)?;
            let store = resolved.open_store();
            plan_cmds::run_plans_command(command, &store).await?;
        }
        Commands::Export { plan, output } => {
            let resolved = FitplanConfig::resolve(store_path)?;
            let store = resolved.open_store();
            export_cmd::run_export(&store, plan.as_deref(), output.as_deref()).await?;
        }
        Commands::Narrate { plan, day, out_dir } => {
            let resolved = FitplanConfig::resolve(store_path)?;
            media_cmds::run_narrate(&resolved, plan.as_deref(), day, &out_dir).await?;
        }
        Commands::Illustrate {
            plan,
            day,
            item,
            category,
            out_dir,
        } => {
            let resolved = FitplanConfig::resolve(store_path)?;
            let target = item.map(|item| IllustrationTarget { category, item });
            media_cmds::run_illustrate(&resolved, plan.as_deref(), day, target, &out_dir).await?;
        }
        Commands::Serve { bind, port } => {
            let resolved = FitplanConfig::resolve(store_path)?;
            serve_cmd::run_serve(resolved.services(), &bind, port).await?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "fitplan", &mut std::io::stdout());
        }
    }

    Ok(())
}
