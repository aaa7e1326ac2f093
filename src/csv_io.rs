use std::io;
use std::path::Path;

use anyhow::Context;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::models::{Activity, NewActivity};
use crate::storage::BlobStore;
use crate::store::ActivityStore;

#[derive(Debug, Deserialize)]
struct CsvRow {
    name: String,
    organization: String,
    role: String,
    category: String,
    start_date: String,
    end_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    is_ongoing: bool,
    description: String,
    hours: Option<f64>,
}

/// An empty cell reads as `false`.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .to_lowercase()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid is_ongoing value: {raw}"))),
        _ => Ok(false),
    }
}

impl CsvRow {
    fn into_new_activity(self) -> Result<NewActivity, String> {
        let end_date = match self.end_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(value.parse()?),
        };
        Ok(NewActivity {
            name: self.name,
            organization: self.organization,
            role: self.role,
            category: self.category.parse()?,
            start_date: self.start_date.parse()?,
            end_date,
            is_ongoing: self.is_ongoing,
            description: self.description,
            hours: self.hours,
        })
    }
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: &'a str,
    name: &'a str,
    organization: &'a str,
    role: &'a str,
    category: &'a str,
    start_date: String,
    end_date: Option<String>,
    is_ongoing: bool,
    description: &'a str,
    hours: Option<f64>,
    linked_in_synced: bool,
    created_at: String,
}

impl<'a> From<&'a Activity> for ExportRow<'a> {
    fn from(activity: &'a Activity) -> Self {
        Self {
            id: &activity.id,
            name: &activity.name,
            organization: &activity.organization,
            role: &activity.role,
            category: activity.category.as_str(),
            start_date: activity.start_date.to_string(),
            end_date: activity.end_date.map(|d| d.to_string()),
            is_ongoing: activity.is_ongoing,
            description: &activity.description,
            hours: activity.hours,
            linked_in_synced: activity.linked_in_synced,
            created_at: activity.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub skipped: usize,
}

pub fn import_csv<B: BlobStore>(
    store: &mut ActivityStore<B>,
    csv_path: &Path,
) -> anyhow::Result<ImportSummary> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    import_from_reader(store, file)
}

/// Adds every valid row to the store in one write. Rows that fail to parse or
/// validate are skipped and counted. A storage failure aborts the import with
/// nothing added.
pub fn import_from_reader<B: BlobStore, R: io::Read>(
    store: &mut ActivityStore<B>,
    input: R,
) -> anyhow::Result<ImportSummary> {
    let mut reader = csv::Reader::from_reader(input);
    let mut summary = ImportSummary::default();
    let mut pending = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let line = index + 2;
        let new_activity = match result
            .map_err(|err| err.to_string())
            .and_then(CsvRow::into_new_activity)
        {
            Ok(new_activity) => new_activity,
            Err(reason) => {
                tracing::warn!(line, reason = %reason, "Skipping unreadable CSV row");
                summary.skipped += 1;
                continue;
            }
        };

        if let Err(err) = new_activity.validate() {
            tracing::warn!(line, error = %err, "Skipping invalid CSV row");
            summary.skipped += 1;
            continue;
        }

        pending.push(new_activity);
    }

    let count = pending.len();
    summary.inserted = store
        .add_many(pending)
        .with_context(|| format!("failed to store {count} imported activities, none were added"))?
        .len();

    tracing::info!(
        inserted = summary.inserted,
        skipped = summary.skipped,
        "CSV import finished"
    );
    Ok(summary)
}

pub fn export_csv(activities: &[Activity], csv_path: &Path) -> anyhow::Result<usize> {
    let file = std::fs::File::create(csv_path)
        .with_context(|| format!("failed to create {}", csv_path.display()))?;
    export_to_writer(activities, file)
}

pub fn export_to_writer<W: io::Write>(activities: &[Activity], output: W) -> anyhow::Result<usize> {
    let mut writer = csv::Writer::from_writer(output);
    for activity in activities {
        writer.serialize(ExportRow::from(activity))?;
    }
    writer.flush()?;
    Ok(activities.len())
}
