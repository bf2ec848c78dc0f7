use std::path::{Path, PathBuf};

use clap::{ArgAction, CommandFactory, ErrorKind, Parser, Subcommand};

use introskip::audio::{self, Comparator, Fingerprint};
use introskip::detector::Season;
use introskip::runner::{Runner, SeasonReport};
use introskip::{AnalysisMode, Config};

#[derive(clap::ValueEnum, Clone, Debug)]
enum Mode {
    Intro,
    Credits,
}

impl From<&Mode> for AnalysisMode {
    fn from(mode: &Mode) -> Self {
        match mode {
            Mode::Intro => AnalysisMode::Introduction,
            Mode::Credits => AnalysisMode::Credits,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[clap(after_help = "Displays info about introskip and its defaults.")]
    Info,

    #[clap(
        arg_required_else_help = true,
        after_help = "Align the fingerprints of two episodes and print the segment found in each. Fingerprint files are either JSON (.json extension) or bincode."
    )]
    Compare {
        #[clap(value_parser = clap::value_parser!(PathBuf), help = "First fingerprint file.")]
        a: PathBuf,

        #[clap(value_parser = clap::value_parser!(PathBuf), help = "Second fingerprint file.")]
        b: PathBuf,

        #[clap(short, long, value_enum, default_value_t = Mode::Intro, help = "Kind of segment to look for. Only affects the maximum accepted duration.")]
        mode: Mode,

        #[clap(
            short,
            long,
            value_parser = clap::value_parser!(PathBuf),
            help = "JSON configuration file. Missing values use their defaults."
        )]
        config: Option<PathBuf>,
    },

    #[clap(
        arg_required_else_help = true,
        after_help = "Search for introductions or end credits in one or more seasons. Each season file is a JSON document listing the season's episodes along with their fingerprints (inline or as a path relative to the season file), silence intervals, chapters and black frames. Chapters are checked first, then fingerprints are compared, and finally (for credits) black frames are searched."
    )]
    Search {
        #[clap(
            required = true,
            multiple_values = true,
            value_parser = clap::value_parser!(PathBuf),
            help = "Season files to search."
        )]
        paths: Vec<PathBuf>,

        #[clap(short, long, value_enum, default_value_t = Mode::Intro, help = "Kind of segment to look for.")]
        mode: Mode,

        #[clap(
            short,
            long,
            value_parser = clap::value_parser!(PathBuf),
            help = "JSON configuration file. Missing values use their defaults."
        )]
        config: Option<PathBuf>,

        #[clap(
            short,
            long,
            value_parser = clap::value_parser!(PathBuf),
            help = "Write the results of the search to this file as JSON."
        )]
        output: Option<PathBuf>,

        #[clap(
            long,
            value_parser = clap::value_parser!(usize),
            help = "Maximum number of seasons to analyze at the same time. Overrides the configuration file."
        )]
        max_parallelism: Option<usize>,

        #[clap(
            long,
            default_value = "false",
            action(ArgAction::SetTrue),
            help = "Do not display results of the search in stdout."
        )]
        no_display: bool,

        #[clap(
            long,
            default_value = "false",
            action(ArgAction::SetTrue),
            help = "Analyze one season at a time."
        )]
        no_threading: bool,
    },
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(
        short,
        long,
        global = true,
        default_value = "false",
        action(ArgAction::SetTrue),
        help = "Log debug messages."
    )]
    verbose: bool,
}

impl Cli {
    fn validate(&self) {
        let mut cmd = Cli::command();
        match &self.command {
            Commands::Info => (),
            Commands::Compare { a, b, config, .. } => {
                for path in [Some(a), Some(b), config.as_ref()].into_iter().flatten() {
                    if !path.exists() {
                        cmd.error(
                            ErrorKind::InvalidValue,
                            format!("{} does not exist", path.display()),
                        )
                        .exit();
                    }
                }
            }
            Commands::Search {
                paths,
                config,
                max_parallelism,
                ..
            } => {
                for path in paths.iter().chain(config) {
                    if !path.exists() {
                        cmd.error(
                            ErrorKind::InvalidValue,
                            format!("{} does not exist", path.display()),
                        )
                        .exit();
                    }
                }
                if *max_parallelism == Some(0) {
                    cmd.error(
                        ErrorKind::InvalidValue,
                        "max_parallelism must be at least 1",
                    )
                    .exit();
                }
            }
        }
    }
}

fn load_config(path: Option<&Path>) -> introskip::Result<Config> {
    match path {
        Some(path) => Config::from_path(path),
        None => Ok(Config::default()),
    }
}

fn display_report(report: &SeasonReport) {
    println!(
        "\n{} season {} ({})\n",
        report.series, report.number, report.mode
    );

    let detection = &report.detection;
    for (id, segment) in &detection.segments {
        match detection.detected_by.get(id) {
            Some(kind) => println!("{} ({})", segment, kind),
            None => println!("{}", segment),
        }
    }
    for id in &detection.unresolved {
        println!("{}: no {} found", id, report.mode);
    }
}

fn main() -> introskip::Result<()> {
    let args = Cli::parse();
    args.validate();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    match args.command {
        Commands::Compare {
            ref a,
            ref b,
            ref mode,
            ref config,
        } => {
            let config = load_config(config.as_deref())?;
            let comparator = Comparator::new(&config)?.with_mode(mode.into());
            let (a, b) = (Fingerprint::from_path(a)?, Fingerprint::from_path(b)?);
            let (lhs, rhs) = comparator.align_pair(&a, &b);
            println!("{}\n{}", lhs, rhs);
        }
        Commands::Search {
            ref paths,
            ref mode,
            ref config,
            ref output,
            max_parallelism,
            no_display,
            no_threading,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(max_parallelism) = max_parallelism {
                config = config.with_max_parallelism(max_parallelism);
            }

            let seasons = paths
                .iter()
                .map(|path| Season::from_path(path))
                .collect::<introskip::Result<Vec<_>>>()?;

            let runner = Runner::new(config, mode.into())?.with_threading(!no_threading);
            let reports = runner.run(&seasons)?;

            if !no_display {
                for report in &reports {
                    display_report(report);
                }
            }

            if let Some(output) = output {
                let f = std::io::BufWriter::new(std::fs::File::create(output)?);
                serde_json::to_writer_pretty(f, &reports)?;
            }
        }
        Commands::Info => {
            let config = Config::default();
            println!("introskip version: {}", env!("CARGO_PKG_VERSION"));
            println!("Seconds per fingerprint point: {}", audio::SAMPLES_TO_SECONDS);
            println!(
                "Multi-threaded search: {}",
                if cfg!(feature = "rayon") {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            println!(
                "Default configuration:\n{}",
                serde_json::to_string_pretty(&config)?
            );
        }
    }

    Ok(())
}
