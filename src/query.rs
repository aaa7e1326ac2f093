use crate::models::{Activity, CategoryCounts, CategoryFilter, Stats};

pub fn filter_by_category<'a, I>(activities: I, filter: CategoryFilter) -> Vec<&'a Activity>
where
    I: IntoIterator<Item = &'a Activity>,
{
    activities
        .into_iter()
        .filter(|activity| match filter {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => activity.category == category,
        })
        .collect()
}

/// Case-insensitive substring match on name, organization and role. An empty
/// or absent query keeps everything.
pub fn search<'a, I>(activities: I, query: Option<&str>) -> Vec<&'a Activity>
where
    I: IntoIterator<Item = &'a Activity>,
{
    let needle = query.map(str::to_lowercase).unwrap_or_default();
    if needle.is_empty() {
        return activities.into_iter().collect();
    }

    activities
        .into_iter()
        .filter(|activity| {
            [&activity.name, &activity.organization, &activity.role]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

pub fn counts_by_category<'a, I>(activities: I) -> CategoryCounts
where
    I: IntoIterator<Item = &'a Activity>,
{
    let mut counts = CategoryCounts::default();
    for activity in activities {
        counts.increment(activity.category);
    }
    counts
}

pub fn stats<'a, I>(activities: I) -> Stats
where
    I: IntoIterator<Item = &'a Activity>,
{
    let mut stats = Stats::default();
    for activity in activities {
        stats.total += 1;
        stats.total_hours += activity.hours.unwrap_or(0.0);
        if activity.linked_in_synced {
            stats.synced += 1;
        }
        if activity.is_ongoing {
            stats.ongoing += 1;
        }
    }
    stats
}
