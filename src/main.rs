use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use setflow::camelot::CamelotKey;
use setflow::flow::FlowReport;
use setflow::model::{DjSet, Track};
use setflow::suggest::{EnergyDirection, SuggestOptions, Suggestion};
use setflow::{energy, harmonic, loader, tempo};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "setflow", version, about = "DJ set flow analyzer")]
struct Cli {
    /// Path to a config file (defaults to the XDG config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Maintain,
    Boost,
    Drop,
}

impl From<Direction> for EnergyDirection {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Maintain => Self::Maintain,
            Direction::Boost => Self::Boost,
            Direction::Drop => Self::Drop,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a set file: transitions, tempo, energy curve
    Analyze {
        /// Set file (.json, .yaml, .toml)
        file: PathBuf,
    },

    /// Classify the key change between two keys
    Classify {
        /// Outgoing key (Camelot code or key name)
        from: String,
        /// Incoming key
        to: String,
    },

    /// List keys compatible with a key
    Compat {
        /// Camelot code (8A) or key name (Am)
        key: String,

        /// Also list the catalog tracks in each tier
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Show the energy tier for a value
    Tier {
        /// Normalized energy (0.0 - 1.0)
        energy: f64,
    },

    /// Rate a tempo change and suggest a ramp
    Tempo {
        /// Outgoing BPM
        from: f64,
        /// Incoming BPM
        to: f64,
    },

    /// Suggest what to play after a track
    Suggest {
        /// Set file containing the current track
        file: PathBuf,

        /// Id of the track currently playing (defaults to the last track)
        #[arg(long)]
        after: Option<String>,

        /// Catalog to pick from (defaults to the other tracks in the set)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Energy move wanted
        #[arg(short, long, value_enum, default_value = "maintain")]
        direction: Direction,

        /// Target energy (0.0 - 1.0)
        #[arg(long)]
        target_energy: Option<f64>,

        /// Target BPM
        #[arg(long)]
        target_bpm: Option<f64>,

        /// Number of results
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Reorder a set for smoother flow
    Optimize {
        /// Set file (.json, .yaml, .toml)
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = match &cli.config {
        Some(path) => setflow::config::AppConfig::load_from(path),
        None => setflow::config::AppConfig::load(),
    };

    let workers = config.resolve_workers();
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build_global()
    {
        log::warn!("Could not size worker pool to {workers}: {e}");
    }

    match cli.command {
        Commands::Analyze { file } => {
            let set = loader::load_set(&file)
                .with_context(|| format!("Failed to load {}", file.display()))?;
            let report = setflow::flow::analyze_with(&set.tracks, &config.flow);

            if cli.json {
                print_json(&report)?;
            } else {
                print_report(&set, &report);
            }
        }

        Commands::Classify { from, to } => {
            let from_key: CamelotKey = from.parse()?;
            let to_key: CamelotKey = to.parse()?;
            let kind = harmonic::classify(Some(from_key), Some(to_key));

            if cli.json {
                print_json(&serde_json::json!({
                    "fromKey": from_key,
                    "toKey": to_key,
                    "classification": kind,
                    "score": kind.score(),
                }))?;
            } else {
                println!(
                    "{} ({}) -> {} ({}): {} ({:.1})",
                    from_key,
                    from_key.key_name(),
                    to_key,
                    to_key.key_name(),
                    kind.label(),
                    kind.score()
                );
            }
        }

        Commands::Compat { key, catalog } => {
            let key: CamelotKey = key.parse()?;
            let compat = harmonic::compatible_set(key);
            let interchange = harmonic::modal_interchange(key);
            let tracks = match &catalog {
                Some(path) => loader::load_catalog(path)
                    .with_context(|| format!("Failed to load catalog {}", path.display()))?,
                None => Vec::new(),
            };
            let matches = harmonic::compatible_tracks(key, &tracks);

            if cli.json {
                print_json(&serde_json::json!({
                    "key": key,
                    "perfect": compat.perfect,
                    "safe": compat.safe,
                    "risky": compat.risky,
                    "modalInterchange": interchange,
                    "tracks": catalog.as_ref().map(|_| &matches),
                }))?;
            } else {
                println!("Compatible keys for {} ({}):", key, key.key_name());
                println!();
                println!("  {:<10} {}", "Perfect", join_keys(&compat.perfect));
                println!("  {:<10} {}", "Smooth", join_keys(&compat.safe));
                println!("  {:<10} {}", "Risky", join_keys(&compat.risky));
                println!("  {:<10} {}", "Modal", join_keys(&interchange));
                println!();
                println!("Every other key clashes.");

                if catalog.is_some() {
                    println!();
                    println!("{} compatible tracks in catalog", matches.len());
                    for (tier, found) in [
                        ("Perfect", &matches.perfect),
                        ("Smooth", &matches.safe),
                        ("Risky", &matches.risky),
                    ] {
                        for t in found {
                            println!("  {:<10} {:>4}  {}", tier, fmt_key(t.key), t.display_name());
                        }
                    }
                }
            }
        }

        Commands::Tier { energy: value } => {
            let tier = energy::tier(energy::normalize(value));
            if cli.json {
                print_json(&serde_json::json!({
                    "energy": value,
                    "tier": tier,
                    "label": tier.label(),
                    "color": tier.color(),
                }))?;
            } else {
                println!("{:.0}% energy: {} ({})", value * 100.0, tier.label(), tier.color());
            }
        }

        Commands::Tempo { from, to } => {
            anyhow::ensure!(from > 0.0 && to > 0.0, "BPM values must be positive");
            let t = tempo::tempo_transition(from, to);
            if cli.json {
                print_json(&t)?;
            } else {
                println!(
                    "{:.1} -> {:.1} BPM ({:+.1}): {:?}, {:?}{}",
                    from,
                    to,
                    t.bpm_difference,
                    t.shift,
                    t.difficulty,
                    if t.recommended { ", recommended" } else { "" }
                );
                if !t.intermediate_bpms.is_empty() {
                    let ramp: Vec<String> =
                        t.intermediate_bpms.iter().map(|b| format!("{b:.0}")).collect();
                    println!("Ramp: {}", ramp.join(" -> "));
                }
            }
        }

        Commands::Suggest {
            file,
            after,
            catalog,
            direction,
            target_energy,
            target_bpm,
            limit,
        } => {
            let set = loader::load_set(&file)
                .with_context(|| format!("Failed to load {}", file.display()))?;

            let current = match &after {
                Some(id) => set
                    .tracks
                    .iter()
                    .find(|t| &t.id == id)
                    .with_context(|| format!("No track with id {id:?} in {}", file.display()))?,
                None => set
                    .tracks
                    .last()
                    .context("Set is empty, nothing to suggest after")?,
            };

            let candidates: Vec<Track> = match &catalog {
                Some(path) => loader::load_catalog(path)
                    .with_context(|| format!("Failed to load catalog {}", path.display()))?,
                None => set.tracks.clone(),
            };

            let opts = SuggestOptions {
                direction: direction.into(),
                target_energy,
                target_bpm,
                weights: config.suggest.clone(),
                limit: Some(limit),
            };
            let suggestions = setflow::suggest::suggest_next(current, &candidates, &opts);

            if cli.json {
                print_json(&suggestions)?;
            } else if suggestions.is_empty() {
                println!("No candidates to suggest.");
            } else {
                println!("After \"{}\":", current.display_name());
                println!();
                print_suggestions(&suggestions);
            }
        }

        Commands::Optimize { file } => {
            let set = loader::load_set(&file)
                .with_context(|| format!("Failed to load {}", file.display()))?;
            let ordered = setflow::suggest::optimize_order(&set.tracks, &config.suggest);
            let optimized = DjSet {
                name: set.name.clone(),
                tracks: ordered,
            };

            if cli.json {
                print_json(&optimized)?;
            } else {
                let before = setflow::flow::analyze_with(&set.tracks, &config.flow);
                let after = setflow::flow::analyze_with(&optimized.tracks, &config.flow);
                print_report(&optimized, &after);
                println!();
                println!(
                    "Harmonic score: {} -> {}",
                    fmt_opt(before.harmonic_score, 2),
                    fmt_opt(after.harmonic_score, 2)
                );
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn join_keys(keys: &[CamelotKey]) -> String {
    keys.iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{v:.precision$}"))
        .unwrap_or_else(|| "-".to_string())
}

fn fmt_key(key: Option<CamelotKey>) -> String {
    key.map(|k| k.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Print a set in order with per-transition verdicts, then the summary.
fn print_report(set: &DjSet, report: &FlowReport) {
    if let Some(name) = &set.name {
        println!("Set: {}", name);
        println!();
    }

    println!(
        "{:>3} {:<32} {:>6} {:>4} {:>6}  {:<10}",
        "#", "Track", "BPM", "Key", "Energy", "Transition"
    );
    println!("{}", "-".repeat(70));

    for (i, t) in set.tracks.iter().enumerate() {
        let name = t.display_name();
        let name_display: String = if name.chars().count() > 32 {
            format!("{}...", name.chars().take(29).collect::<String>())
        } else {
            name
        };

        // Transition into this track from the previous one
        let transition = i
            .checked_sub(1)
            .and_then(|prev| report.transitions.get(prev))
            .map(|tr| tr.classification.as_str())
            .unwrap_or("");

        println!(
            "{:>3} {:<32} {:>6} {:>4} {:>6}  {:<10}",
            i + 1,
            name_display,
            fmt_opt(t.tempo, 1),
            fmt_key(t.key),
            fmt_opt(t.energy, 2),
            transition,
        );
    }

    println!();
    println!("Mean BPM:       {}", fmt_opt(report.mean_tempo, 1));
    println!(
        "Mean energy:    {} ({})",
        fmt_opt(report.mean_energy, 2),
        report.energy_tier.label()
    );
    println!("Harmonic score: {}", fmt_opt(report.harmonic_score, 2));
    if let Some(secs) = report.total_duration_secs {
        let total = secs.round() as u64;
        println!("Duration:       {}:{:02}", total / 60, total % 60);
    }
    if !report.energy_drops.is_empty() {
        let drops: Vec<String> = report
            .energy_drops
            .iter()
            .map(|p| (p + 1).to_string())
            .collect();
        println!("Energy drops at track {}", drops.join(", "));
    }
}

fn print_suggestions(suggestions: &[Suggestion<'_>]) {
    println!(
        "{:<32} {:>6} {:>4} {:>6} {:>5}  {}",
        "Track", "BPM", "Key", "Energy", "Score", "Why"
    );
    println!("{}", "-".repeat(90));

    for s in suggestions {
        let name = s.track.display_name();
        let name_display: String = if name.chars().count() > 32 {
            format!("{}...", name.chars().take(29).collect::<String>())
        } else {
            name
        };

        println!(
            "{:<32} {:>6} {:>4} {:>6} {:>5.2}  {}",
            name_display,
            fmt_opt(s.track.tempo, 1),
            fmt_key(s.track.key),
            fmt_opt(s.track.energy, 2),
            s.score,
            s.reasons.join(", "),
        );
    }
}
