use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;

use facescan_core::annotation::infrastructure::outline_annotator::OutlineAnnotator;
use facescan_core::detection::domain::scan_config::ScanConfig;
use facescan_core::detection::infrastructure::haar_face_detector::HaarCascadeDetector;
use facescan_core::detection::infrastructure::xml_cascade_loader::load_model_file;
use facescan_core::imaging::infrastructure::image_file_reader::ImageFileReader;
use facescan_core::imaging::infrastructure::image_file_writer::ImageFileWriter;
use facescan_core::pipeline::detect_image_use_case::DetectImageUseCase;
use facescan_core::shared::constants::{DEFAULT_CASCADE_FILE, IMAGE_EXTENSIONS};
use facescan_core::shared::region::FaceBox;

/// Haar cascade face detection for still images.
#[derive(Parser)]
#[command(name = "facescan")]
struct Cli {
    /// Input image (JPEG, PNG, GIF, ...).
    input: PathBuf,

    /// Write a copy of the input with detected faces outlined.
    output: Option<PathBuf>,

    /// Cascade XML file.
    #[arg(long, default_value = DEFAULT_CASCADE_FILE)]
    cascade: PathBuf,

    /// Require 4 neighboring windows per face instead of 3.
    #[arg(long)]
    higher_confidence: bool,

    /// Also outline every raw candidate window (needs an output file).
    #[arg(long)]
    show_candidates: bool,

    /// Worker threads for the scan (overrides the config file).
    #[arg(long)]
    threads: Option<usize>,

    /// JSON file with scan parameters.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print faces as JSON instead of one line per face.
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = load_config(&cli)?;
    let model = load_model_file(&cli.cascade)?;
    let detector = HaarCascadeDetector::new(Arc::new(model), config, cli.higher_confidence)?;

    let mut use_case = DetectImageUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(ImageFileWriter::new()),
        Box::new(detector),
        Box::new(OutlineAnnotator::new()),
        cli.show_candidates,
    );
    let result = use_case.execute(&cli.input, cli.output.as_deref())?;

    print_faces(&result.faces, cli.json)?;
    if let Some(output) = &cli.output {
        log::info!("Output written to {}", output.display());
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<ScanConfig, Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => ScanConfig::from_json_file(path)?,
        None => ScanConfig::default(),
    };
    let config = match cli.threads {
        Some(threads) => config.with_threads(threads),
        None => config,
    };
    config.validate()?;
    Ok(config)
}

fn print_faces(faces: &[FaceBox], json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(faces)?);
    } else {
        for f in faces {
            println!("{} {} {} {}", f.x, f.y, f.width, f.height);
        }
    }
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if !is_image(&cli.input) {
        return Err(format!(
            "Unsupported input type: {} (expected one of {})",
            cli.input.display(),
            IMAGE_EXTENSIONS.join(", ")
        )
        .into());
    }
    if !cli.cascade.exists() {
        return Err(format!("Cascade file not found: {}", cli.cascade.display()).into());
    }
    if let Some(output) = &cli.output {
        if !is_image(output) {
            return Err(format!(
                "Unsupported output type: {} (expected one of {})",
                output.display(),
                IMAGE_EXTENSIONS.join(", ")
            )
            .into());
        }
    }
    if cli.show_candidates && cli.output.is_none() {
        return Err("--show-candidates requires an output file".into());
    }
    if cli.threads == Some(0) {
        return Err("Threads must be at least 1".into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
