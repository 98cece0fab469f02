use std::{path::PathBuf, thread, time::Duration};

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use log::{error, warn};
use roundwatch::{
    AppConfig, MetricsCache, RoundDetail, RoundMetrics, RoundQuery, RoundStatus, RoundwatchError,
    derive_round_metrics,
    notes::NoteLine,
    round::{load_round_detail, load_round_details_jsonl, parse_timestamp},
    summarize_timeline,
    writer::write_metrics,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Derive duration, scan coverage and map nodes for one round
    Metrics {
        #[arg(short, long)]
        input: PathBuf,

        /// Evaluate in-progress rounds at this instant instead of now
        #[arg(long, value_parser = parse_instant)]
        now: Option<DateTime<Utc>>,

        /// Print the metrics as JSON
        #[arg(long)]
        json: bool,

        /// Also print the event timeline
        #[arg(short, long)]
        timeline: bool,
    },
    /// Print the event timeline of one round
    Timeline {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// List rounds from a JSON Lines export
    List {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        date: Option<NaiveDate>,

        #[arg(short, long)]
        guard: Option<u64>,
    },
    /// Write metrics for every round of a JSON Lines export
    Export {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(long, value_parser = parse_instant)]
        now: Option<DateTime<Utc>>,
    },
    /// Re-read a round file and print live metrics until the round completes
    Watch {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        refresh_rate_ms: Option<u64>,
    },
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(value).ok_or_else(|| format!("{:?} is not an ISO 8601 timestamp", value))
}

fn print_metrics(detail: &RoundDetail, metrics: &RoundMetrics) {
    let round = &detail.round;
    println!(
        "Round #{} - {} [{}]",
        round.id,
        round.guard_name(),
        round.status.label()
    );
    println!(
        "Duration {} | valid scans {} | average segment {}",
        metrics.duration_label,
        metrics.coverage_label(),
        metrics.average_segment_label
    );
    for node in &metrics.map_nodes {
        println!(
            "  {:<11} {:<30} {}",
            format!("{:?}", node.status).to_uppercase(),
            node.label,
            node.elapsed_label.as_deref().unwrap_or("-")
        );
    }
}

fn print_timeline(detail: &RoundDetail) {
    let entries = summarize_timeline(detail);
    if entries.is_empty() {
        println!("No events recorded for this round.");
        return;
    }
    for entry in entries {
        let timestamp = entry
            .timestamp
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "unknown time".to_string());
        println!("{} {:<8} {}", timestamp, entry.kind, entry.description);
        if let Some(location) = &entry.location {
            println!("    location: {}", location);
        }
        if let Some(map_url) = &entry.map_url {
            println!("    map: {}", map_url);
        }
        for note in &entry.notes {
            match note {
                NoteLine::Header(text) => println!("    -- {} --", text),
                NoteLine::Check { checked, text } => {
                    println!("    [{}] {}", if *checked { "x" } else { " " }, text)
                }
                NoteLine::Text(text) => println!("    \"{}\"", text),
            }
        }
        if entry.tasks_total > 0 {
            println!("    tasks: {}/{}", entry.tasks_completed, entry.tasks_total);
        }
        if let Some(category) = &entry.incident_category {
            println!("    category: {}", category);
        }
        if let Some(detail) = &entry.incident_detail {
            println!("    detail: {}", detail);
        }
        if entry.evidence_count > 0 {
            println!("    evidence: {} file(s)", entry.evidence_count);
        }
    }
}

fn metrics(
    input: &PathBuf,
    now: Option<DateTime<Utc>>,
    json: bool,
    show_timeline: bool,
    config: &AppConfig,
) -> Result<(), RoundwatchError> {
    let detail = load_round_detail(input)?;
    let metrics = derive_round_metrics(
        &detail,
        now.unwrap_or_else(Utc::now),
        &config.derivation_options(),
    );
    if json {
        let output = serde_json::to_string_pretty(&metrics)
            .map_err(|e| RoundwatchError::MetricsSerializeError { source: e })?;
        println!("{}", output);
    } else {
        print_metrics(&detail, &metrics);
    }
    if show_timeline {
        print_timeline(&detail);
    }
    Ok(())
}

fn list(input: &PathBuf, date: Option<NaiveDate>, guard: Option<u64>) -> Result<(), RoundwatchError> {
    let details = load_round_details_jsonl(input)?;
    let query = RoundQuery {
        date,
        guard_id: guard,
    };
    let rounds = query.apply(details.iter().map(|d| &d.round));
    if rounds.is_empty() {
        println!("No rounds found.");
    }
    for round in rounds {
        println!(
            "#{:<6} {:<28} {} -> {} [{}]",
            round.id,
            round.guard_name(),
            round.start_time.to_rfc3339(),
            round
                .end_time
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
            round.status.label()
        );
    }
    Ok(())
}

fn export(
    input: &PathBuf,
    output: &PathBuf,
    now: Option<DateTime<Utc>>,
    config: &AppConfig,
) -> Result<(), RoundwatchError> {
    let details = load_round_details_jsonl(input)?;
    let now = now.unwrap_or_else(Utc::now);
    let options = config.derivation_options();
    let metrics: Vec<RoundMetrics> = details
        .iter()
        .map(|detail| derive_round_metrics(detail, now, &options))
        .collect();
    write_metrics(output, &metrics)
}

fn watch(input: &PathBuf, refresh_rate_ms: u64, config: &AppConfig) -> Result<(), RoundwatchError> {
    if refresh_rate_ms == 0 {
        return Err(RoundwatchError::InvalidUserInput {
            field: "refresh_rate_ms".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }

    let mut cache = MetricsCache::new(config.derivation_options());
    let mut last_printed: Option<RoundMetrics> = None;
    loop {
        // the file may be mid-write, so a failed read is retried on the next tick
        match load_round_detail(input) {
            Ok(detail) => {
                let metrics = cache.metrics(&detail, Utc::now());
                if last_printed.as_ref() != Some(&metrics) {
                    print_metrics(&detail, &metrics);
                    last_printed = Some(metrics);
                }
                if detail.round.status == RoundStatus::Completed {
                    return Ok(());
                }
            }
            Err(e @ RoundwatchError::InvalidRoundFile { .. }) => return Err(e),
            Err(e) => warn!("Could not reload {:?}: {}", input, e),
        }
        thread::sleep(Duration::from_millis(refresh_rate_ms));
    }
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    })
    .expect("Could not set Ctrl-C handler");

    let config = AppConfig::from_local_file().unwrap_or_default();
    let result = match &cli.command {
        Commands::Metrics {
            input,
            now,
            json,
            timeline,
        } => metrics(input, *now, *json, *timeline || config.show_timeline, &config),
        Commands::Timeline { input } => load_round_detail(input).map(|d| print_timeline(&d)),
        Commands::List { input, date, guard } => list(input, *date, *guard),
        Commands::Export { input, output, now } => export(input, output, *now, &config),
        Commands::Watch {
            input,
            refresh_rate_ms,
        } => watch(
            input,
            refresh_rate_ms.unwrap_or(config.refresh_rate_ms),
            &config,
        ),
    };

    if let Err(e) = result {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
