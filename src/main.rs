//! # mbt-extract
//!
//! Command-line front end for turning MIBIscope bin files into per-channel TIFF images.
//!
//! ## Usage
//!
//! ```bash
//! # Extract every fov of a run with the panel stored in each descriptor
//! mbt-extract extract data/run1 out/run1
//!
//! # Explicit panel, intensities for SMA, keep pulse counts alongside
//! mbt-extract extract data/run1 out/run1 --panel panel.csv --intensity-targets SMA --no-replace
//!
//! # Median pulse height of one channel
//! mbt-extract median-height data/run1 fov-1-scan-1 SMA
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use mbt::diagnostics::{get_histograms_per_tof, median_height_vs_mean_pp, total_counts};
use mbt::extraction::{ExtractOptions, extract_bin_files};
use mbt::parser::read_descriptor;
use mbt::processing::DEFAULT_TIME_RES;
use mbt::types::{IntensityPolicy, PanelSpec};
use mbt::utils::channel_manager::read_panel_csv;
use mbt::utils::file_utils::find_bin_files;
use mbt::MibiFile;

/// Extract pulse count and intensity images from MIBIscope bin files
#[derive(Parser)]
#[command(name = "mbt-extract")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PanelArgs {
    /// CSV panel with Mass, Target, Start and Stop columns
    #[arg(long, value_name = "CSV", conflicts_with = "window")]
    panel: Option<PathBuf>,

    /// Integration window around every descriptor panel mass
    #[arg(
        long,
        num_args = 2,
        value_names = ["LOW", "HIGH"],
        allow_negative_numbers = true,
        default_values_t = [-0.3, 0.0]
    )]
    window: Vec<f64>,

    /// Time resolution of the tof axis in seconds
    #[arg(long, default_value_t = DEFAULT_TIME_RES)]
    time_res: f64,
}

impl PanelArgs {
    fn panel_spec(&self) -> Result<PanelSpec> {
        match &self.panel {
            Some(path) => {
                let df = read_panel_csv(path)
                    .with_context(|| format!("Failed to read panel {}", path.display()))?;
                Ok(PanelSpec::Explicit(df))
            }
            None => match self.window.as_slice() {
                [low, high] => Ok(PanelSpec::global(*low, *high)),
                other => anyhow::bail!("--window takes two values, got {}", other.len()),
            },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every fov of a directory into a TIFF tree
    Extract {
        /// Directory with paired .bin/.json files
        #[arg(value_name = "DATA_DIR")]
        data_dir: PathBuf,

        /// Output directory
        #[arg(value_name = "OUT_DIR")]
        out_dir: PathBuf,

        #[command(flatten)]
        panel: PanelArgs,

        /// Fovs to extract (default: all)
        #[arg(long, value_delimiter = ',')]
        include: Option<Vec<String>>,

        /// Targets to keep from the panel (default: all)
        #[arg(long, value_delimiter = ',')]
        channels: Option<Vec<String>>,

        /// Extract intensities for every target
        #[arg(long, conflicts_with = "intensity_targets")]
        all_intensities: bool,

        /// Extract intensities for these targets only
        #[arg(long, value_delimiter = ',')]
        intensity_targets: Option<Vec<String>>,

        /// Keep pulse count images next to the intensity images
        #[arg(long)]
        no_replace: bool,

        /// Also write intensity * width images (requires --no-replace)
        #[arg(long, requires = "no_replace")]
        intensity_width: bool,

        /// Worker threads (default: one per core)
        #[arg(short = 'j', long)]
        threads: Option<usize>,
    },

    /// Print the width, intensity and pulse histograms of one channel
    Histogram {
        data_dir: PathBuf,
        fov: String,
        channel: String,

        #[command(flatten)]
        panel: PanelArgs,
    },

    /// Median pulse height and mean pulses per trigger of one channel
    MedianHeight {
        data_dir: PathBuf,
        fov: String,
        channel: String,

        #[command(flatten)]
        panel: PanelArgs,
    },

    /// Total pulse count of every fov
    TotalCounts {
        data_dir: PathBuf,

        #[arg(long, value_delimiter = ',')]
        include: Option<Vec<String>>,
    },

    /// Display header information of the bin files in a directory
    Info {
        data_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Extract {
            data_dir,
            out_dir,
            panel,
            include,
            channels,
            all_intensities,
            intensity_targets,
            no_replace,
            intensity_width,
            threads,
        } => {
            let intensities = match (all_intensities, intensity_targets) {
                (true, _) => IntensityPolicy::All,
                (false, Some(targets)) => IntensityPolicy::Subset(targets),
                (false, None) => IntensityPolicy::Off,
            };
            let opts = ExtractOptions::builder()
                .panel(panel.panel_spec()?)
                .intensities(intensities)
                .replace(!no_replace)
                .time_res(panel.time_res)
                .maybe_include(include)
                .maybe_channels(channels)
                .intensity_width(intensity_width)
                .maybe_threads(threads)
                .build();
            run_extract(&data_dir, &out_dir, &opts)
        }
        Commands::Histogram {
            data_dir,
            fov,
            channel,
            panel,
        } => run_histogram(&data_dir, &fov, &channel, &panel),
        Commands::MedianHeight {
            data_dir,
            fov,
            channel,
            panel,
        } => {
            let (median, mean_pp) = median_height_vs_mean_pp(
                &data_dir,
                &fov,
                &channel,
                &panel.panel_spec()?,
                panel.time_res,
            )
            .with_context(|| format!("Failed to compute pulse heights of {fov}/{channel}"))?;
            println!("median pulse height: {median}");
            println!("mean pulses per trigger: {mean_pp:.4}");
            Ok(())
        }
        Commands::TotalCounts { data_dir, include } => {
            let counts = total_counts(&data_dir, include.as_deref())
                .context("Failed to count pulses")?;
            for (fov, count) in counts {
                println!("{fov}\t{count}");
            }
            Ok(())
        }
        Commands::Info { data_dir } => run_info(&data_dir),
    }
}

fn run_extract(data_dir: &Path, out_dir: &Path, opts: &ExtractOptions) -> Result<()> {
    info!("Input:  {}", data_dir.display());
    info!("Output: {}", out_dir.display());
    info!("Intensities: {:?} (replace: {})", opts.intensities, opts.replace);

    extract_bin_files(data_dir, Some(out_dir), opts).context("Extraction failed")?;

    info!("Extraction complete");
    Ok(())
}

fn run_histogram(data_dir: &Path, fov: &str, channel: &str, panel: &PanelArgs) -> Result<()> {
    let hist = get_histograms_per_tof(data_dir, fov, channel, &panel.panel_spec()?, panel.time_res)
        .with_context(|| format!("Failed to build histograms of {fov}/{channel}"))?;

    println!("kind\tbin\tcount");
    for (kind, values) in [
        ("width", &hist.widths),
        ("intensity", &hist.intensities),
        ("pulses", &hist.pulses),
    ] {
        for (bin, count) in values.iter().enumerate().filter(|&(_, &count)| count > 0) {
            println!("{kind}\t{bin}\t{count}");
        }
    }
    Ok(())
}

fn run_info(data_dir: &Path) -> Result<()> {
    let fov_files = find_bin_files(data_dir, None)
        .with_context(|| format!("Failed to list {}", data_dir.display()))?;

    for acquisition in fov_files.values() {
        let file = MibiFile::open(&acquisition.bin_path)
            .with_context(|| format!("Failed to open {}", acquisition.bin_path.display()))?;
        let descriptor = read_descriptor(&acquisition.json_path)
            .with_context(|| format!("Failed to read {}", acquisition.json_path.display()))?;

        println!(
            "{} ({})",
            acquisition.name,
            descriptor.fov_label().unwrap_or("unnamed")
        );
        print!("{}", file.get_summary());
        match descriptor.conjugates() {
            Some(conjugates) => println!("  Panel: {} targets", conjugates.len()),
            None => println!("  Panel: none (moly point)"),
        }
    }
    Ok(())
}
