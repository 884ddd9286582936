//! Bindery CLI - render and inspect template blocks against a fixture site

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;

use bindery::block::{block_type, BlockInstance, PreviewMode};
use bindery::error::{BinderyError, FixSuggestion};
use bindery::{parse_attributes, BinderyConfig, BlockAttributes, BlockRenderer, EditorPreview, FixtureSite, SourceRegistry};

#[derive(Parser)]
#[command(name = "bindery")]
#[command(about = "Bindery - templating block with binding sources")]
#[command(version)]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.config/bindery/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a block the way the front end would
    Render {
        /// Path to the block attributes (JSON)
        file: PathBuf,

        /// Site fixture (YAML): subjects, template parts, patterns, sources
        #[arg(short, long)]
        site: Option<PathBuf>,

        /// Id of the subject the block is rendered for
        #[arg(short, long)]
        post_id: Option<u64>,

        /// Treat the request as an editor preview (honours previewPostId)
        #[arg(long)]
        preview: bool,

        /// Render as a privileged user (detailed error blocks)
        #[arg(long)]
        admin: bool,

        /// Wrapper classes of the block
        #[arg(long, default_value = "wp-block-bindery-template")]
        class: String,
    },

    /// Render the editor preview of a block
    Preview {
        /// Path to the block attributes (JSON)
        file: PathBuf,

        /// Site fixture (YAML)
        #[arg(short, long)]
        site: Option<PathBuf>,

        /// Override the block's previewMode (default, server-side, twigjs)
        #[arg(short, long)]
        mode: Option<PreviewMode>,

        /// Id of the subject the block is rendered for
        #[arg(short, long)]
        post_id: Option<u64>,
    },

    /// Print the block registration descriptor
    Schema,

    /// Validate block attributes and report metadata drift
    Check {
        /// Path to the block attributes (JSON)
        file: PathBuf,
    },
}

fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Render {
            file,
            site,
            post_id,
            preview,
            admin,
            class,
        } => render_block(config, &file, site.as_deref(), post_id, preview, admin, &class),
        Commands::Preview {
            file,
            site,
            mode,
            post_id,
        } => preview_block(config, &file, site.as_deref(), mode, post_id),
        Commands::Schema => print_schema(),
        Commands::Check { file } => check_block(&file),
    });

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<BinderyConfig, BinderyError> {
    match path {
        Some(path) => Ok(BinderyConfig::load_from(path)?.with_env()),
        None => BinderyConfig::load(),
    }
}

fn load_attributes(file: &Path) -> Result<BlockAttributes, BinderyError> {
    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(file)?)?;
    parse_attributes(&raw)
}

fn load_site(path: Option<&Path>) -> Result<(FixtureSite, Arc<SourceRegistry>), BinderyError> {
    let site = match path {
        Some(path) => FixtureSite::load(path)?,
        None => FixtureSite::new(),
    };
    let registry = SourceRegistry::with_builtins();
    site.register_sources(&registry)?;
    Ok((site, Arc::new(registry)))
}

fn render_block(
    config: BinderyConfig,
    file: &Path,
    site: Option<&Path>,
    post_id: Option<u64>,
    preview: bool,
    admin: bool,
    class: &str,
) -> Result<(), BinderyError> {
    let attributes = load_attributes(file)?;
    let (site, registry) = load_site(site)?;
    let site = site.preview(preview).privileged(admin);

    let mut block = BlockInstance::with_classes(class);
    block.context.post_id = post_id;

    let renderer = BlockRenderer::new(Arc::new(site), registry, config);
    println!("{}", renderer.render(&attributes, "", &block));
    Ok(())
}

fn preview_block(
    config: BinderyConfig,
    file: &Path,
    site: Option<&Path>,
    mode: Option<PreviewMode>,
    post_id: Option<u64>,
) -> Result<(), BinderyError> {
    let attributes = load_attributes(file)?;
    let (site, registry) = load_site(site)?;
    let site = site.preview(true).privileged(true);

    let mut block = BlockInstance::with_classes("wp-block-bindery-template");
    block.context.post_id = post_id;

    let preview = EditorPreview::new(BlockRenderer::new(Arc::new(site), registry, config));
    let mode = mode.unwrap_or(attributes.preview_mode);
    println!("{}", preview.render_mode(mode, &attributes, &block));
    Ok(())
}

fn print_schema() -> Result<(), BinderyError> {
    println!("{}", serde_json::to_string_pretty(&block_type())?);
    Ok(())
}

fn check_block(file: &Path) -> Result<(), BinderyError> {
    let attributes = load_attributes(file)?;

    let drift = attributes.metadata_drift();
    if !drift.is_empty() {
        let details: Vec<String> = drift.iter().map(ToString::to_string).collect();
        return Err(BinderyError::MetadataDrift {
            details: details.join("; "),
        });
    }

    println!(
        "{} {} ({} bindings)",
        "✓".green(),
        file.display(),
        attributes.context_bindings.len()
    );
    for (index, decl) in attributes.context_bindings.iter().enumerate() {
        if decl.parse_arguments().is_invalid() {
            println!(
                "  {} binding {} ({}): arguments are not valid JSON",
                "!".yellow(),
                index,
                decl.variable_name
            );
        }
    }
    Ok(())
}
