use std::path::PathBuf;

use activity_tracker::config::{Config, LogFormat};
use activity_tracker::models::{ActivityPatch, Category, CategoryFilter, NewActivity, YearMonth};
use activity_tracker::storage::FileBlobStore;
use activity_tracker::store::ActivityStore;
use activity_tracker::{csv_io, query, report};
use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "activity-tracker")]
#[command(about = "Track extracurricular activities and their LinkedIn sync state", long_about = None)]
struct Cli {
    /// Directory holding stored activities (overrides ACTIVITY_TRACKER_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List activities, newest first
    List {
        #[arg(long, default_value = "all")]
        category: CategoryFilter,
        /// Case-insensitive match on name, organization or role
        #[arg(long)]
        search: Option<String>,
    },
    /// Show every field of one activity
    Show { id: String },
    /// Add a new activity
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        organization: String,
        #[arg(long)]
        role: String,
        #[arg(long, default_value = "clubs")]
        category: Category,
        #[arg(long, value_name = "YYYY-MM")]
        start: YearMonth,
        #[arg(long, value_name = "YYYY-MM", conflicts_with = "ongoing")]
        end: Option<YearMonth>,
        #[arg(long)]
        ongoing: bool,
        #[arg(long)]
        description: String,
        #[arg(long)]
        hours: Option<f64>,
    },
    /// Change fields of an existing activity
    #[command(group(
        ArgGroup::new("end_date")
            .args(["end", "clear_end"])
            .multiple(false)
    ))]
    #[command(group(
        ArgGroup::new("hours_value")
            .args(["hours", "clear_hours"])
            .multiple(false)
    ))]
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        organization: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        category: Option<Category>,
        #[arg(long, value_name = "YYYY-MM")]
        start: Option<YearMonth>,
        #[arg(long, value_name = "YYYY-MM")]
        end: Option<YearMonth>,
        #[arg(long)]
        clear_end: bool,
        #[arg(long, conflicts_with = "not_ongoing")]
        ongoing: bool,
        #[arg(long)]
        not_ongoing: bool,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        hours: Option<f64>,
        #[arg(long)]
        clear_hours: bool,
    },
    /// Remove an activity
    Delete { id: String },
    /// Flip the LinkedIn sync flag of one activity
    ToggleSync { id: String },
    /// Mark every activity as synced to LinkedIn
    SyncAll,
    /// Count activities per category
    Counts,
    /// Show totals across all activities
    Stats,
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "all")]
        category: CategoryFilter,
        #[arg(long, default_value = "activity-report.md")]
        out: PathBuf,
    },
    /// Import activities from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Export activities to a CSV file
    Export {
        #[arg(long)]
        csv: PathBuf,
    },
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("activity_tracker=info,warn"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env().context("invalid activity tracker configuration")?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    init_logging(config.log_format);

    let blob = FileBlobStore::new(&config.data_dir);
    tracing::debug!(dir = %blob.dir().display(), key = %config.storage_key, "Opening activity store");
    let mut store = ActivityStore::open(blob, config.store_options()).with_context(|| {
        format!(
            "failed to load activities from {}",
            config.data_dir.display()
        )
    })?;

    match cli.command {
        Commands::List { category, search } => {
            let filtered = store.filter_by_category(category);
            let matches = query::search(filtered, search.as_deref());

            if matches.is_empty() {
                println!("No activities found.");
                return Ok(());
            }
            for activity in matches {
                println!("{}  {}", activity.id, report::summary_line(activity));
            }
        }
        Commands::Show { id } => match store.get(&id) {
            Some(activity) => {
                println!("{}", activity.name);
                println!("  id:           {}", activity.id);
                println!("  organization: {}", activity.organization);
                println!("  role:         {}", activity.role);
                println!("  category:     {}", activity.category.label());
                println!("  period:       {}", report::format_period(activity));
                if let Some(hours) = activity.hours {
                    println!("  hours:        {}", report::format_hours(hours));
                }
                println!(
                    "  linkedin:     {}",
                    if activity.linked_in_synced { "synced" } else { "not synced" }
                );
                println!("  created:      {}", activity.created_at.to_rfc3339());
                println!("  {}", activity.description);
            }
            None => println!("Activity {id} not found."),
        },
        Commands::Add {
            name,
            organization,
            role,
            category,
            start,
            end,
            ongoing,
            description,
            hours,
        } => {
            let activity = store.add_validated(NewActivity {
                name,
                organization,
                role,
                category,
                start_date: start,
                end_date: end,
                is_ongoing: ongoing,
                description,
                hours,
            })?;
            println!(
                "\"{}\" has been added to your activities (id {}).",
                activity.name, activity.id
            );
        }
        Commands::Edit {
            id,
            name,
            organization,
            role,
            category,
            start,
            end,
            clear_end,
            ongoing,
            not_ongoing,
            description,
            hours,
            clear_hours,
        } => {
            let patch = ActivityPatch {
                name,
                organization,
                role,
                category,
                start_date: start,
                end_date: if clear_end { Some(None) } else { end.map(Some) },
                is_ongoing: match (ongoing, not_ongoing) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                description,
                hours: if clear_hours { Some(None) } else { hours.map(Some) },
                linked_in_synced: None,
            };

            if patch.is_empty() {
                println!("Nothing to change.");
                return Ok(());
            }
            if store.get(&id).is_none() {
                println!("Activity {id} not found.");
                return Ok(());
            }
            store.update_validated(&id, patch)?;
            if let Some(activity) = store.get(&id) {
                println!("\"{}\" has been updated.", activity.name);
            }
        }
        Commands::Delete { id } => {
            let name = store.get(&id).map(|a| a.name.clone());
            store.delete(&id)?;
            match name {
                Some(name) => println!("\"{name}\" has been removed."),
                None => println!("Activity {id} not found."),
            }
        }
        Commands::ToggleSync { id } => {
            store.toggle_sync(&id)?;
            match store.get(&id) {
                Some(activity) if activity.linked_in_synced => {
                    println!("\"{}\" marked for LinkedIn sync.", activity.name)
                }
                Some(activity) => println!("\"{}\" unmarked for LinkedIn sync.", activity.name),
                None => println!("Activity {id} not found."),
            }
        }
        Commands::SyncAll => {
            let changed = store.sync_all()?;
            if changed > 0 {
                println!("{changed} activities marked for sync.");
            } else {
                println!("All activities are already synced!");
            }
        }
        Commands::Counts => {
            let counts = store.counts_by_category();
            println!("All: {}", counts.all);
            for category in Category::ALL {
                println!(
                    "{}: {}",
                    category.label(),
                    counts.get(CategoryFilter::Only(category))
                );
            }
        }
        Commands::Stats => {
            let stats = store.stats();
            println!("Total activities: {}", stats.total);
            println!("Hours logged: {}", report::format_hours(stats.total_hours));
            println!("LinkedIn synced: {}/{}", stats.synced, stats.total);
            println!("Active now: {}", stats.ongoing);
        }
        Commands::Report { category, out } => {
            let report = report::build_report(category, chrono::Utc::now(), store.activities());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Import { csv } => {
            let summary = csv_io::import_csv(&mut store, &csv)?;
            println!(
                "Imported {} activities from {} ({} skipped).",
                summary.inserted,
                csv.display(),
                summary.skipped
            );
        }
        Commands::Export { csv } => {
            let written = csv_io::export_csv(store.activities(), &csv)?;
            println!("Exported {written} activities to {}.", csv.display());
        }
    }

    Ok(())
}
