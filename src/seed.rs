use chrono::{DateTime, Utc};

use crate::models::{Activity, Category, YearMonth};

const fn month(year: i32, month: u32) -> YearMonth {
    YearMonth::from_parts(year, month)
}

/// Example records written when no stored activities exist yet.
pub fn default_activities(now: DateTime<Utc>) -> Vec<Activity> {
    vec![
        Activity {
            id: "1".to_string(),
            name: "Student Government".to_string(),
            organization: "University Student Association".to_string(),
            role: "Vice President".to_string(),
            category: Category::Leadership,
            start_date: month(2023, 9),
            end_date: None,
            is_ongoing: true,
            description: "Lead initiatives to improve campus life, organize events, and represent student interests to administration.".to_string(),
            hours: Some(320.0),
            linked_in_synced: true,
            created_at: now,
        },
        Activity {
            id: "2".to_string(),
            name: "Habitat for Humanity".to_string(),
            organization: "Local Chapter".to_string(),
            role: "Build Team Lead".to_string(),
            category: Category::Volunteer,
            start_date: month(2022, 6),
            end_date: Some(month(2023, 8)),
            is_ongoing: false,
            description: "Coordinated weekend builds and managed volunteer teams of 15+ members.".to_string(),
            hours: Some(200.0),
            linked_in_synced: false,
            created_at: now,
        },
        Activity {
            id: "3".to_string(),
            name: "Machine Learning Research".to_string(),
            organization: "Computer Science Department".to_string(),
            role: "Research Assistant".to_string(),
            category: Category::Research,
            start_date: month(2024, 1),
            end_date: None,
            is_ongoing: true,
            description: "Conducting research on natural language processing applications in healthcare.".to_string(),
            hours: Some(150.0),
            linked_in_synced: true,
            created_at: now,
        },
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::validation;

    #[test]
    fn seed_records_have_unique_ids_and_valid_fields() {
        let seed = default_activities(Utc::now());
        assert_eq!(seed.len(), 3);

        let ids: Vec<&str> = seed.iter().map(|a| a.id.as_str()).collect();
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
        assert_eq!(ids, vec!["1", "2", "3"]);

        for activity in &seed {
            assert!(activity.description.chars().count() >= validation::MIN_DESCRIPTION_CHARS);
            assert!(!activity.is_ongoing || activity.end_date.is_none());
        }
        assert_eq!(seed[1].end_date.map(|d| d.to_string()).as_deref(), Some("2023-08"));
    }
}
