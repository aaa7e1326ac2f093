use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{Activity, Category, CategoryFilter};
use crate::query;

pub fn format_period(activity: &Activity) -> String {
    match (activity.is_ongoing, activity.end_date) {
        (true, _) => format!("{} - Present", activity.start_date),
        (false, Some(end)) => format!("{} - {}", activity.start_date, end),
        (false, None) => activity.start_date.to_string(),
    }
}

pub fn format_hours(hours: f64) -> String {
    if hours.fract() == 0.0 {
        format!("{:.0}", hours)
    } else {
        format!("{:.1}", hours)
    }
}

/// One-line summary used by listings and the report body.
pub fn summary_line(activity: &Activity) -> String {
    let mut line = format!(
        "{} ({}, {}) [{}] {}",
        activity.name,
        activity.role,
        activity.organization,
        activity.category.label(),
        format_period(activity)
    );
    if let Some(hours) = activity.hours {
        let _ = write!(line, ", {} hours", format_hours(hours));
    }
    if activity.linked_in_synced {
        line.push_str(", synced to LinkedIn");
    }
    line
}

pub fn build_report(
    filter: CategoryFilter,
    generated_at: DateTime<Utc>,
    activities: &[Activity],
) -> String {
    let stats = query::stats(activities);
    let counts = query::counts_by_category(activities);
    let selected = query::filter_by_category(activities, filter);

    let mut output = String::new();
    let scope_label = match filter {
        CategoryFilter::All => "all categories",
        CategoryFilter::Only(category) => category.label(),
    };

    let _ = writeln!(output, "# Extracurricular Activity Report");
    let _ = writeln!(
        output,
        "Generated for {} on {}",
        scope_label,
        generated_at.format("%Y-%m-%d")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Total activities: {}", stats.total);
    let _ = writeln!(output, "- Hours logged: {}", format_hours(stats.total_hours));
    let _ = writeln!(output, "- LinkedIn synced: {}/{}", stats.synced, stats.total);
    let _ = writeln!(output, "- Active now: {}", stats.ongoing);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Categories");
    for category in Category::ALL {
        let _ = writeln!(
            output,
            "- {}: {}",
            category.label(),
            counts.get(CategoryFilter::Only(category))
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Activities");

    if selected.is_empty() {
        let _ = writeln!(output, "No activities recorded for this selection.");
    } else {
        for activity in selected {
            let _ = writeln!(output, "- {}", summary_line(activity));
            let _ = writeln!(output, "  {}", activity.description);
        }
    }

    output
}
