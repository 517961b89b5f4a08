use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feature_configurator::models::{FeatureKind, FeatureTree, FeatureUpdate, ModelEdit};
use feature_configurator::registry::SessionRegistry;
use feature_configurator::settings::Settings;
use feature_configurator::{api, format, render, ConfigurationSession};

#[derive(Parser)]
#[command(name = "fcfg")]
#[command(about = "Configure feature models: propagate selections, validate, count configurations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a configuration: tree, open constraints and remaining configurations
    Inspect {
        /// Feature model (XML or JSON); falls back to the configured default model
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// Configuration file; a fresh configuration is shown when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Select or deselect a feature and rewrite the configuration file
    #[command(group(ArgGroup::new("state").required(true).args(["on", "off"])))]
    Toggle {
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// Configuration file, created if missing
        config: PathBuf,
        feature: String,
        #[arg(long)]
        on: bool,
        #[arg(long)]
        off: bool,
    },
    /// Write the selected feature names, one per line
    Features {
        #[arg(short, long)]
        model: Option<PathBuf>,
        config: PathBuf,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Edit the feature model file in place
    Model {
        #[arg(short, long)]
        model: Option<PathBuf>,
        #[command(subcommand)]
        edit: ModelCommand,
    },
    /// Start the session HTTP host
    Serve {
        /// Port for HTTP API
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the effective settings
    Settings {
        /// Persist the effective settings to the config file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Subcommand)]
enum ModelCommand {
    /// Add a plain feature under PARENT; a plain parent becomes an AND group
    Add {
        parent: String,
        name: String,
        #[arg(long)]
        mandatory: bool,
        #[arg(long = "abstract")]
        is_abstract: bool,
    },
    /// Remove a feature and everything below it
    Remove { feature: String },
    /// Change a feature's name, group type or flags
    Update {
        feature: String,
        #[arg(long)]
        rename: Option<String>,
        /// One of feature, and, or, alt
        #[arg(long = "type", value_parser = parse_kind)]
        kind: Option<FeatureKind>,
        #[arg(long)]
        mandatory: Option<bool>,
        #[arg(long = "abstract")]
        is_abstract: Option<bool>,
    },
}

impl From<ModelCommand> for ModelEdit {
    fn from(command: ModelCommand) -> Self {
        match command {
            ModelCommand::Add {
                parent,
                name,
                mandatory,
                is_abstract,
            } => ModelEdit::AddChild {
                parent,
                name,
                mandatory,
                is_abstract,
            },
            ModelCommand::Remove { feature } => ModelEdit::Remove { feature },
            ModelCommand::Update {
                feature,
                rename,
                kind,
                mandatory,
                is_abstract,
            } => ModelEdit::Update {
                feature,
                changes: FeatureUpdate {
                    name: rename,
                    kind,
                    mandatory,
                    is_abstract,
                },
            },
        }
    }
}

fn parse_kind(s: &str) -> Result<FeatureKind, String> {
    FeatureKind::from_str(s).ok_or_else(|| format!("unknown feature type: {s}"))
}

/// Initialize tracing. Logs go to stderr so documents written to stdout stay clean.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "feature_configurator=info,tower_http=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn resolve_model(model: Option<PathBuf>, settings: &Settings) -> anyhow::Result<PathBuf> {
    model
        .or_else(|| settings.default_model.clone())
        .ok_or_else(|| anyhow::anyhow!("No feature model given and no default model configured"))
}

fn load_tree(path: &Path) -> anyhow::Result<FeatureTree> {
    let root = format::load_model(path)
        .with_context(|| format!("Failed to load feature model {}", path.display()))?;
    Ok(FeatureTree::build(&root)?)
}

fn open_session(model: &Path, config: Option<&Path>) -> anyhow::Result<ConfigurationSession> {
    let tree = load_tree(model)?;
    match config.filter(|path| path.exists()) {
        Some(path) => {
            let document = fs::read_to_string(path)
                .with_context(|| format!("Failed to read configuration {}", path.display()))?;
            Ok(ConfigurationSession::from_document(tree, &document)?)
        }
        None => Ok(ConfigurationSession::fresh(tree)),
    }
}

fn print_state(session: &ConfigurationSession) -> anyhow::Result<()> {
    let state = session.current_state()?;
    print!("{}", session.render());
    println!();
    if state.validation.valid {
        println!("Configuration is valid");
    } else {
        println!("Configuration is invalid:");
        for violation in &state.validation.violations {
            println!("  - {}", violation);
        }
    }
    println!("Possible configurations: {}", state.count);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let settings = Settings::load();

    match cli.command {
        Commands::Inspect { model, config } => {
            let model = resolve_model(model, &settings)?;
            let session = open_session(&model, config.as_deref())?;
            print_state(&session)?;
        }
        Commands::Toggle {
            model,
            config,
            feature,
            on,
            off: _,
        } => {
            let model = resolve_model(model, &settings)?;
            let mut session = open_session(&model, Some(config.as_path()))?;
            session.toggle(&feature, on)?;
            fs::write(&config, session.export_selection()?)
                .with_context(|| format!("Failed to write configuration {}", config.display()))?;
            tracing::info!("Configuration saved to {}", config.display());
            print_state(&session)?;
        }
        Commands::Features {
            model,
            config,
            output,
        } => {
            let model = resolve_model(model, &settings)?;
            let session = open_session(&model, Some(config.as_path()))?;
            let list = session.export_feature_list();
            match output {
                Some(path) => {
                    fs::write(&path, list)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!("Selected features written to {}", path.display());
                }
                None => print!("{}", list),
            }
        }
        Commands::Model { model, edit } => {
            let model = resolve_model(model, &settings)?;
            let mut root = format::load_model(&model)
                .with_context(|| format!("Failed to load feature model {}", model.display()))?;
            root.apply(&edit.into())?;
            let tree = FeatureTree::build(&root)?;
            format::save_model(&model, &root)?;
            print!("{}", render::render_configuration(&tree, &format::default_selection(&tree)));
        }
        Commands::Serve { port } => {
            let port = port.unwrap_or(settings.port);
            let addr = format!("{}:{}", settings.bind, port);
            let app = api::create_router(SessionRegistry::new());

            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Feature configurator listening on http://{}", addr);

            axum::serve(listener, app).await?;
        }
        Commands::Settings { save } => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            if save {
                settings.save()?;
            }
        }
    }

    Ok(())
}
