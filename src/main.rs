use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use posterkit::{
    api,
    config::AppCfg,
    io::{self, Export},
    orchestrator::Studio,
    styles::StyleCatalog,
    types::{AspectRatio, FocusPoints, GenerationConfig, ProductAngle},
};

#[derive(Parser)]
#[command(name = "posterkit")]
#[command(about = "Turn a product photo into an ad poster and captioned detail shots")]
#[command(version)]
struct Cli {
    /// YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the studio HTTP API
    Serve {
        /// Address to bind, overrides the config file
        #[arg(long)]
        bind: Option<String>,
    },

    /// Generate one poster set and write it to disk
    Generate {
        /// Product photo
        #[arg(short, long)]
        image: PathBuf,

        /// Style id (see `posterkit styles`)
        #[arg(short, long, default_value = "hotel-luxury")]
        style: String,

        #[arg(long, value_enum, default_value_t = AspectRatio::Portrait)]
        aspect: AspectRatio,

        #[arg(long, value_enum, default_value_t = ProductAngle::Front)]
        angle: ProductAngle,

        /// Feature to highlight in a close-up (up to 3)
        #[arg(long = "focus")]
        focus: Vec<String>,

        /// Output directory, overrides the config file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List the preset styles
    Styles,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "posterkit=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let cfg = AppCfg::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| cfg.bind.clone());
            let studio = Studio::new(posterkit::key_gate(&cfg));
            api::serve(&bind, studio).await
        }
        Commands::Generate { image, style, aspect, angle, focus, out } => {
            let focus_points = FocusPoints::new(focus)?;
            let out_dir = out.unwrap_or_else(|| cfg.out_dir.clone());
            generate_once(&cfg, image, &style, GenerationConfig { aspect_ratio: aspect, product_angle: angle, focus_points }, out_dir).await
        }
        Commands::Styles => {
            for s in StyleCatalog::new().styles() {
                println!("{:<18} {}  [{}]", s.id, s.name, s.tags.join(", "));
            }
            Ok(())
        }
    }
}

async fn generate_once(cfg: &AppCfg, image: PathBuf, style: &str, gen: GenerationConfig, out_dir: PathBuf) -> Result<()> {
    let gate = posterkit::key_gate(cfg);
    if !gate.has_key() {
        bail!("{} is not set", cfg.provider.api_key_env);
    }
    let studio = Studio::new(gate);

    let bytes = tokio::fs::read(&image).await.with_context(|| format!("reading {}", image.display()))?;
    studio.upload(&bytes).await?;
    let style = studio.select_style(style)?;
    // upload clears the focus points, so apply the config afterwards
    studio.set_config(gen);

    let Some(outcome) = studio.generate().await? else {
        bail!("nothing to generate");
    };
    let description = studio.snapshot().description;
    let sidecar = io::save_output(
        &out_dir,
        &Export {
            id: &outcome.entry.id,
            style: style.short_name(),
            description: &description,
            poster: &outcome.entry.image,
            details: &outcome.details,
        },
    )
    .await?;
    println!("Saved poster set: {}", sidecar.display());
    Ok(())
}
