use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Leadership,
    Volunteer,
    Sports,
    Clubs,
    Research,
    Arts,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Leadership,
        Category::Volunteer,
        Category::Sports,
        Category::Clubs,
        Category::Research,
        Category::Arts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Leadership => "leadership",
            Self::Volunteer => "volunteer",
            Self::Sports => "sports",
            Self::Clubs => "clubs",
            Self::Research => "research",
            Self::Arts => "arts",
        }
    }

    /// Human-readable label used in listings and reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Leadership => "Leadership",
            Self::Volunteer => "Volunteer",
            Self::Sports => "Sports",
            Self::Clubs => "Clubs & Organizations",
            Self::Research => "Research",
            Self::Arts => "Arts & Creative",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "leadership" => Ok(Self::Leadership),
            "volunteer" => Ok(Self::Volunteer),
            "sports" => Ok(Self::Sports),
            "clubs" => Ok(Self::Clubs),
            "research" => Ok(Self::Research),
            "arts" => Ok(Self::Arts),
            _ => Err(format!("Invalid category: {}", s)),
        }
    }
}

/// Either every category or a single one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(category) => fmt::Display::fmt(category, f),
        }
    }
}

/// A calendar month, stored as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    /// Caller guarantees `1 <= month <= 12`.
    pub(crate) const fn from_parts(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (year, month) = trimmed
            .split_once('-')
            .ok_or_else(|| format!("Invalid year-month (expected YYYY-MM): {}", s))?;
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if year.len() != 4 || month.len() != 2 || !digits(year) || !digits(month) {
            return Err(format!("Invalid year-month (expected YYYY-MM): {}", s));
        }
        let year: i32 = year
            .parse()
            .map_err(|_| format!("Invalid year in {}", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("Invalid month in {}", s))?;
        Self::new(year, month).ok_or_else(|| format!("Month out of range in {}", s))
    }
}

impl TryFrom<String> for YearMonth {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub name: String,
    pub organization: String,
    pub role: String,
    pub category: Category,
    pub start_date: YearMonth,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_month"
    )]
    pub end_date: Option<YearMonth>,
    pub is_ongoing: bool,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<f64>,
    #[serde(default)]
    pub linked_in_synced: bool,
    pub created_at: DateTime<Utc>,
}

/// Reads `null`, a missing field, or an empty string as no month.
fn deserialize_optional_month<'de, D>(deserializer: D) -> Result<Option<YearMonth>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw.parse().map(Some).map_err(de::Error::custom),
        _ => Ok(None),
    }
}

/// Caller-supplied fields for a new activity. The store assigns `id`,
/// `created_at` and `linked_in_synced`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub name: String,
    pub organization: String,
    pub role: String,
    pub category: Category,
    pub start_date: YearMonth,
    pub end_date: Option<YearMonth>,
    pub is_ongoing: bool,
    pub description: String,
    pub hours: Option<f64>,
}

impl NewActivity {
    pub(crate) fn into_activity(self, id: String, created_at: DateTime<Utc>) -> Activity {
        Activity {
            id,
            name: self.name,
            organization: self.organization,
            role: self.role,
            category: self.category,
            start_date: self.start_date,
            end_date: if self.is_ongoing { None } else { self.end_date },
            is_ongoing: self.is_ongoing,
            description: self.description,
            hours: self.hours,
            linked_in_synced: false,
            created_at,
        }
    }
}

/// Shallow patch applied by `update`. `None` leaves a field untouched; the
/// nested options on `end_date` and `hours` allow clearing them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityPatch {
    pub name: Option<String>,
    pub organization: Option<String>,
    pub role: Option<String>,
    pub category: Option<Category>,
    pub start_date: Option<YearMonth>,
    pub end_date: Option<Option<YearMonth>>,
    pub is_ongoing: Option<bool>,
    pub description: Option<String>,
    pub hours: Option<Option<f64>>,
    pub linked_in_synced: Option<bool>,
}

impl ActivityPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn apply(self, activity: &mut Activity) {
        let touches_dates = self.is_ongoing.is_some() || self.end_date.is_some();

        if let Some(name) = self.name {
            activity.name = name;
        }
        if let Some(organization) = self.organization {
            activity.organization = organization;
        }
        if let Some(role) = self.role {
            activity.role = role;
        }
        if let Some(category) = self.category {
            activity.category = category;
        }
        if let Some(start_date) = self.start_date {
            activity.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            activity.end_date = end_date;
        }
        if let Some(is_ongoing) = self.is_ongoing {
            activity.is_ongoing = is_ongoing;
        }
        if let Some(description) = self.description {
            activity.description = description;
        }
        if let Some(hours) = self.hours {
            activity.hours = hours;
        }
        if let Some(synced) = self.linked_in_synced {
            activity.linked_in_synced = synced;
        }

        if touches_dates && activity.is_ongoing {
            activity.end_date = None;
        }
    }
}

/// Record counts keyed by category, plus the overall total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    pub all: usize,
    pub leadership: usize,
    pub volunteer: usize,
    pub sports: usize,
    pub clubs: usize,
    pub research: usize,
    pub arts: usize,
}

impl CategoryCounts {
    pub fn get(&self, filter: CategoryFilter) -> usize {
        match filter {
            CategoryFilter::All => self.all,
            CategoryFilter::Only(Category::Leadership) => self.leadership,
            CategoryFilter::Only(Category::Volunteer) => self.volunteer,
            CategoryFilter::Only(Category::Sports) => self.sports,
            CategoryFilter::Only(Category::Clubs) => self.clubs,
            CategoryFilter::Only(Category::Research) => self.research,
            CategoryFilter::Only(Category::Arts) => self.arts,
        }
    }

    pub(crate) fn increment(&mut self, category: Category) {
        let slot = match category {
            Category::Leadership => &mut self.leadership,
            Category::Volunteer => &mut self.volunteer,
            Category::Sports => &mut self.sports,
            Category::Clubs => &mut self.clubs,
            Category::Research => &mut self.research,
            Category::Arts => &mut self.arts,
        };
        *slot += 1;
        self.all += 1;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stats {
    pub total: usize,
    pub total_hours: f64,
    pub synced: usize,
    pub ongoing: usize,
}
