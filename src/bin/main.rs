use clap::{Args, Parser, Subcommand};
use log::info;
use polymer_scaling_rs::{
    load_points_from_csv, regress_points, save_fits_to_csv, save_points_to_csv, write_points_csv, write_table,
    AnalysisContext, CombinedSelection, DirectoryScan, ExplicitFiles, SchemaSource, DEFAULT_MAX_WINDOW,
    DEFAULT_WINDOW, TRAJECTORY_EXTENSION,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// Command-line tool for estimating polymer scaling exponents from LAMMPS trajectories
#[derive(Parser)]
#[command(name = "polymer-scaling")]
#[command(about = "Fit end-to-end distance scaling across LAMMPS dump trajectories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Which trajectory files to load and how to read their columns
#[derive(Args)]
struct InputArgs {
    /// Trajectory files, one per chain length
    files: Vec<PathBuf>,

    /// Also load every matching file in this directory
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Extension matched by --dir
    #[arg(long, default_value = TRAJECTORY_EXTENSION)]
    extension: String,

    /// Column schema, e.g. "id=0 position=1,2,3", or "auto" to read the ATOMS header
    #[arg(short, long, default_value = "id=0 position=1,2,3")]
    schema: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the scaling table for window sizes 1..=max-window
    Report {
        #[command(flatten)]
        input: InputArgs,

        /// Largest window size (default: 150)
        #[arg(long, default_value_t = DEFAULT_MAX_WINDOW)]
        max_window: usize,

        /// Write the table to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also save the per-window fits as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Fit the scaling slope for a single window size
    Fit {
        #[command(flatten)]
        input: InputArgs,

        /// Number of trailing snapshots averaged per trajectory (default: 5)
        #[arg(short, long, default_value_t = DEFAULT_WINDOW)]
        window: usize,
    },

    /// Write the (n, r) sample points for one window size as CSV
    Points {
        #[command(flatten)]
        input: InputArgs,

        /// Number of trailing snapshots averaged per trajectory (default: 5)
        #[arg(short, long, default_value_t = DEFAULT_WINDOW)]
        window: usize,

        /// Output CSV path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fit sample points previously written by the points command
    Regress {
        /// Path to the points CSV
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn fail(context: &str, e: impl std::fmt::Display) -> ! {
    eprintln!("❌ {}: {}", context, e);
    std::process::exit(1);
}

fn load(input: InputArgs) -> AnalysisContext {
    let schema: SchemaSource = match input.schema.parse() {
        Ok(s) => s,
        Err(e) => fail("Invalid --schema", e),
    };
    info!("Using schema: {}", input.schema);

    let selection = CombinedSelection {
        explicit: ExplicitFiles::new(input.files),
        scan: input.dir.map(|d| DirectoryScan::new(d, input.extension)),
    };

    match AnalysisContext::load(&selection, &schema) {
        Ok(ctx) => ctx,
        Err(e) => fail("Error loading trajectories", e),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            input,
            max_window,
            output,
            csv,
        } => {
            let ctx = load(input);
            info!("Fitting window sizes 1..={}", max_window);

            let fits = match ctx.window_fits(1..=max_window) {
                Ok(f) => f,
                Err(e) => fail("Error fitting trajectories", e),
            };

            let written = match &output {
                Some(path) => File::create(path).and_then(|f| write_table(&mut BufWriter::new(f), &fits)),
                None => write_table(&mut io::stdout().lock(), &fits),
            };
            if let Err(e) = written {
                fail("Error writing table", e);
            }
            if let Some(path) = output {
                info!("Table saved to: {:?}", path);
            }

            if let Some(path) = csv {
                if let Err(e) = save_fits_to_csv(&fits, &path) {
                    fail("Error saving fits", e);
                }
                info!("Fits saved to: {:?}", path);
            }
        }

        Commands::Fit { input, window } => {
            let ctx = load(input);
            match ctx.regress(window) {
                Ok(fit) => {
                    println!("window:    {}", window);
                    println!("slope:     {:.6} ± {:.6}", fit.slope, fit.std_error);
                    println!("exponent:  {:.6} ± {:.6}", fit.exponent(), fit.exponent_error());
                }
                Err(e) => fail("Error fitting trajectories", e),
            }
        }

        Commands::Points { input, window, output } => {
            let ctx = load(input);
            let points = match ctx.sample_points(window) {
                Ok(p) => p,
                Err(e) => fail("Error sampling trajectories", e),
            };

            let written = match &output {
                Some(path) => save_points_to_csv(&points, path),
                None => {
                    let stdout = io::stdout();
                    write_points_csv(stdout.lock(), &points, std::path::Path::new("<stdout>"))
                }
            };
            if let Err(e) = written {
                fail("Error writing points", e);
            }
            if let Some(path) = output {
                info!("{} points saved to: {:?}", points.len(), path);
            }
        }

        Commands::Regress { input } => {
            let points = match load_points_from_csv(&input) {
                Ok(p) => {
                    info!("Loaded {} points from CSV", p.len());
                    p
                }
                Err(e) => fail("Error loading points", e),
            };

            match regress_points(&points) {
                Ok(fit) => {
                    println!("slope:     {:.6} ± {:.6}", fit.slope, fit.std_error);
                    println!("exponent:  {:.6} ± {:.6}", fit.exponent(), fit.exponent_error());
                }
                Err(e) => fail("Error fitting points", e),
            }
        }
    }

    if let Err(e) = io::stdout().flush() {
        fail("Error flushing stdout", e);
    }
}
