use clap::{Parser, Subcommand};
use cli::{annotate, coordinates_json, discover_mask_sets, load_probability_mask, run_batch, SeamConfig};
use color_eyre::eyre::Result;
use seam::Pipeline;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about = "Weld seam line extraction from segmentation masks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the seam line from one set of candidate masks
    Detect {
        /// Mask images, one per detected instance (8-bit, value / 255 = probability)
        #[arg(short, long = "mask", required = true, num_args = 1..)]
        masks: Vec<PathBuf>,
        /// Path to a TOML or JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the binarization threshold
        #[arg(long)]
        threshold: Option<f32>,
        /// Source image to draw the seam onto
        #[arg(long, requires = "annotated")]
        image: Option<PathBuf>,
        /// Where to write the annotated image
        #[arg(long, requires = "image")]
        annotated: Option<PathBuf>,
    },
    /// Extract seam lines for every mask set (sub-directory) under a directory
    Batch {
        /// Directory whose sub-directories each hold one set of mask images
        #[arg(short, long)]
        input: PathBuf,
        /// Path to a TOML or JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the default configuration as TOML
    Config,
    /// Print the JSON schema of the configuration file
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Detect {
            masks,
            config,
            threshold,
            image,
            annotated,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(threshold) = threshold {
                config.pipeline.threshold = *threshold;
            }
            detect(masks, &config, image.as_deref(), annotated.as_deref())?;
        }
        Commands::Batch {
            input,
            config,
            output,
        } => {
            let config = load_config(config.as_deref())?;
            batch(input, &config, output.as_deref()).await?;
        }
        Commands::Config => {
            print!("{}", SeamConfig::default().to_toml()?);
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&SeamConfig::schema())?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SeamConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Ok(SeamConfig::from_file(path)?)
        }
        None => Ok(SeamConfig::default()),
    }
}

fn detect(
    mask_paths: &[PathBuf],
    config: &SeamConfig,
    image_path: Option<&Path>,
    annotated_path: Option<&Path>,
) -> Result<()> {
    let pipeline = Pipeline::from_config(&config.pipeline)?;
    info!("{}", pipeline.info());

    let masks = mask_paths
        .iter()
        .map(load_probability_mask)
        .collect::<Result<Vec<_>, _>>()?;
    info!("Loaded {} mask candidate(s)", masks.len());

    let segment = pipeline.detect(&masks)?;
    match &segment {
        Some(segment) => info!("Seam line {:?} -> {:?}", segment.start(), segment.end()),
        None => warn!("No seam line found"),
    }
    println!("{}", coordinates_json(segment.as_ref())?);

    if let (Some(image_path), Some(annotated_path)) = (image_path, annotated_path) {
        // The frame is written back even when no line was found
        let mut image = image::open(image_path)?.to_rgb8();
        if let Some(segment) = &segment {
            annotate(&mut image, segment, &config.annotation);
        }
        image.save(annotated_path)?;
        info!("Annotated image written to {:?}", annotated_path);
    }

    Ok(())
}

async fn batch(input: &Path, config: &SeamConfig, output: Option<&Path>) -> Result<()> {
    let pipeline = Arc::new(Pipeline::from_config(&config.pipeline)?);
    let sets = discover_mask_sets(input)?;
    info!("Processing {} mask set(s) from {:?}", sets.len(), input);

    let entries = run_batch(pipeline, sets).await;
    let found = entries.iter().filter(|e| e.segment.is_some()).count();
    info!("Found seam lines in {}/{} mask set(s)", found, entries.len());

    let report = serde_json::to_string_pretty(&entries)?;
    match output {
        Some(path) => {
            std::fs::write(path, report)?;
            info!("Report written to {:?}", path);
        }
        None => println!("{report}"),
    }

    Ok(())
}
