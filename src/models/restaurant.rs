use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Moderation state shared by restaurant listings and their submissions.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    NeedsChanges,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Pending => "pending",
            ListingStatus::Approved => "approved",
            ListingStatus::Rejected => "rejected",
            ListingStatus::NeedsChanges => "needs_changes",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ListingStatus::Pending),
            "approved" => Ok(ListingStatus::Approved),
            "rejected" => Ok(ListingStatus::Rejected),
            "needs_changes" => Ok(ListingStatus::NeedsChanges),
            other => Err(AppError::validation(format!("unknown status '{other}'"))),
        }
    }
}

/// Price buckets used for filtering and for the badge shown on cards.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PriceCategory {
    Budget,
    Standard,
    Good,
    Premium,
    HighEnd,
}

impl PriceCategory {
    pub const ALL: [PriceCategory; 5] = [
        PriceCategory::Budget,
        PriceCategory::Standard,
        PriceCategory::Good,
        PriceCategory::Premium,
        PriceCategory::HighEnd,
    ];

    /// Category a menu price is displayed under.
    pub fn from_price(price: f64) -> Self {
        if price <= 8.0 {
            PriceCategory::Budget
        } else if price <= 10.0 {
            PriceCategory::Standard
        } else if price <= 12.0 {
            PriceCategory::Good
        } else if price <= 15.0 {
            PriceCategory::Premium
        } else {
            PriceCategory::HighEnd
        }
    }

    /// Whether a price falls inside this bucket when used as a search filter.
    /// The budget bucket starts at 6 euros; cheaper menus only match explicit bounds.
    pub fn contains(&self, price: f64) -> bool {
        match self {
            PriceCategory::Budget => (6.0..=8.0).contains(&price),
            PriceCategory::Standard => price > 8.0 && price <= 10.0,
            PriceCategory::Good => price > 10.0 && price <= 12.0,
            PriceCategory::Premium => price > 12.0 && price <= 15.0,
            PriceCategory::HighEnd => price > 15.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceCategory::Budget => "budget",
            PriceCategory::Standard => "standard",
            PriceCategory::Good => "good",
            PriceCategory::Premium => "premium",
            PriceCategory::HighEnd => "high-end",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PriceCategory::Budget => "Económico",
            PriceCategory::Standard => "Padrão",
            PriceCategory::Good => "Bom Valor",
            PriceCategory::Premium => "Premium",
            PriceCategory::HighEnd => "Luxo",
        }
    }
}

impl FromStr for PriceCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PriceCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("unknown price range '{s}'")))
    }
}

/// What the fixed-price menu includes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Inclusion {
    Soup,
    Main,
    Drink,
    Coffee,
    Dessert,
    Wine,
    Bread,
}

impl FromStr for Inclusion {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "soup" => Ok(Inclusion::Soup),
            "main" => Ok(Inclusion::Main),
            "drink" => Ok(Inclusion::Drink),
            "coffee" => Ok(Inclusion::Coffee),
            "dessert" => Ok(Inclusion::Dessert),
            "wine" => Ok(Inclusion::Wine),
            "bread" => Ok(Inclusion::Bread),
            other => Err(AppError::validation(format!("unknown inclusion '{other}'"))),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PracticalInfo {
    #[serde(default)]
    pub cards_accepted: bool,
    #[serde(default)]
    pub parking: bool,
    #[serde(default)]
    pub quick_service: bool,
    #[serde(default)]
    pub group_friendly: bool,
    #[serde(default)]
    pub near_metro: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Opening hours keyed by lowercase weekday ("monday" ..), values like
/// "12:00-15:00,19:00-22:30" or "closed".
pub type WeeklyHours = BTreeMap<String, String>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub city: String,
    pub district: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    pub menu_price: f64,
    pub price_range: PriceCategory,
    pub food_type: String,
    #[serde(default)]
    pub whats_included: BTreeSet<Inclusion>,
    #[serde(default)]
    pub practical: PracticalInfo,
    #[serde(default)]
    pub google_rating: Option<f64>,
    #[serde(default)]
    pub google_reviews: Option<i64>,
    /// Average of the visible menu reviews, one decimal. Zero when unreviewed.
    #[serde(default)]
    pub menu_rating: f64,
    #[serde(default)]
    pub menu_reviews: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub dishes: Vec<String>,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub restaurant_photo: Option<String>,
    #[serde(default)]
    pub menu_photo: Option<String>,
    #[serde(default)]
    pub hours: WeeklyHours,
    pub status: ListingStatus,
    #[serde(default)]
    pub submitted_by: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
}

impl Restaurant {
    /// Rating used for sorting and the minimum-rating filter: the menu rating
    /// when the restaurant has menu reviews, the Google rating otherwise.
    pub fn display_rating(&self) -> Option<f64> {
        if self.menu_reviews > 0 && self.menu_rating > 0.0 {
            Some(self.menu_rating)
        } else {
            self.google_rating.filter(|r| *r > 0.0)
        }
    }

    pub fn total_reviews(&self) -> i64 {
        self.menu_reviews + self.google_reviews.unwrap_or(0)
    }

    pub fn set_menu_price(&mut self, price: f64) {
        self.menu_price = price;
        self.price_range = PriceCategory::from_price(price);
    }
}

/// The restaurant payload a user submits for moderation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantDraft {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    pub menu_price: f64,
    pub food_type: String,
    #[serde(default)]
    pub whats_included: BTreeSet<Inclusion>,
    #[serde(default)]
    pub practical: PracticalInfo,
    #[serde(default)]
    pub google_rating: Option<f64>,
    #[serde(default)]
    pub google_reviews: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub dishes: Vec<String>,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub restaurant_photo: Option<String>,
    #[serde(default)]
    pub menu_photo: Option<String>,
    #[serde(default)]
    pub hours: WeeklyHours,
}

impl RestaurantDraft {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut problems = Vec::new();
        if self.name.trim().is_empty() || self.name.len() > 200 {
            problems.push("name must be between 1 and 200 characters");
        }
        if self.address.trim().is_empty() {
            problems.push("address is required");
        }
        if !(self.menu_price > 0.0 && self.menu_price <= 100.0) {
            problems.push("menuPrice must be between 0 and 100 euros");
        }
        if self.food_type.trim().is_empty() {
            problems.push("foodType is required");
        }
        if let Some(rating) = self.google_rating {
            if !(0.0..=5.0).contains(&rating) {
                problems.push("googleRating must be between 0 and 5");
            }
        }
        if self.google_reviews.is_some_and(|n| n < 0) {
            problems.push("googleReviews cannot be negative");
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(AppError::validation(problems.join(", ")))
        }
    }

    /// City and district, falling back to the trailing parts of the address
    /// ("Rua X, 12, Cedofeita, Porto" gives district "Cedofeita", city "Porto").
    pub fn locality(&self) -> (String, String) {
        let parts: Vec<&str> = self
            .address
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        let city = self
            .city
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| {
                if parts.len() > 1 {
                    parts[parts.len() - 1].to_string()
                } else {
                    "Unknown".to_string()
                }
            });

        let district = self
            .district
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| {
                if parts.len() > 2 {
                    parts[parts.len() - 2].to_string()
                } else {
                    city.clone()
                }
            });

        (city, district)
    }
}
