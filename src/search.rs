use chrono::{DateTime, Datelike, Duration, NaiveDateTime, TimeZone, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::error::AppError;
use crate::models::restaurant::WeeklyHours;
use crate::models::{Coordinates, Inclusion, PriceCategory, Restaurant};

pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 50.0;
pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Rating,
    Price,
    Distance,
    Name,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Each set field must match the restaurant's practical info exactly.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PracticalFilter {
    pub cards_accepted: Option<bool>,
    pub parking: Option<bool>,
    pub quick_service: Option<bool>,
    pub group_friendly: Option<bool>,
    pub near_metro: Option<bool>,
}

impl PracticalFilter {
    fn matches(&self, restaurant: &Restaurant) -> bool {
        let p = &restaurant.practical;
        [
            (self.cards_accepted, p.cards_accepted),
            (self.parking, p.parking),
            (self.quick_service, p.quick_service),
            (self.group_friendly, p.group_friendly),
            (self.near_metro, p.near_metro),
        ]
        .into_iter()
        .all(|(wanted, actual)| wanted.map_or(true, |w| w == actual))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub query: Option<String>,
    pub location: Option<String>,
    pub user_location: Option<Coordinates>,
    pub max_distance: Option<f64>,
    pub price_range: Option<PriceCategory>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub food_types: BTreeSet<String>,
    pub included: BTreeSet<Inclusion>,
    pub practical: PracticalFilter,
    pub min_rating: Option<f64>,
    pub min_google_rating: Option<f64>,
    pub has_menu_reviews: bool,
    pub open_now: bool,
    pub last_updated_days: Option<i64>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub page: usize,
    pub limit: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            query: None,
            location: None,
            user_location: None,
            max_distance: None,
            price_range: None,
            min_price: None,
            max_price: None,
            food_types: BTreeSet::new(),
            included: BTreeSet::new(),
            practical: PracticalFilter::default(),
            min_rating: None,
            min_google_rating: None,
            has_menu_reviews: false,
            open_now: false,
            last_updated_days: None,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Flat query-string form of [`SearchParams`]. Lists are comma separated.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub query: Option<String>,
    pub location: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub max_distance: Option<f64>,
    pub price_range: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub food_types: Option<String>,
    pub included: Option<String>,
    pub cards_accepted: Option<bool>,
    pub parking: Option<bool>,
    pub quick_service: Option<bool>,
    pub group_friendly: Option<bool>,
    pub near_metro: Option<bool>,
    pub min_rating: Option<f64>,
    pub min_google_rating: Option<f64>,
    pub has_menu_reviews: Option<bool>,
    pub open_now: Option<bool>,
    pub last_updated_days: Option<i64>,
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(value: Option<&str>) -> impl Iterator<Item = &str> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

impl TryFrom<SearchQuery> for SearchParams {
    type Error = AppError;

    fn try_from(q: SearchQuery) -> Result<Self, Self::Error> {
        let user_location = match (q.lat, q.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            (None, None) => None,
            _ => return Err(AppError::validation("lat and lng must be given together")),
        };

        let price_range = match non_blank(q.price_range).as_deref() {
            None | Some("any") => None,
            Some(name) => Some(name.parse::<PriceCategory>()?),
        };

        if q.last_updated_days.is_some_and(|days| days < 0) {
            return Err(AppError::validation("lastUpdatedDays must not be negative"));
        }

        let included = split_list(q.included.as_deref())
            .map(str::parse::<Inclusion>)
            .collect::<Result<BTreeSet<Inclusion>, _>>()?;

        Ok(SearchParams {
            food_types: split_list(q.food_types.as_deref()).map(String::from).collect(),
            query: non_blank(q.query),
            location: non_blank(q.location),
            user_location,
            max_distance: q.max_distance,
            price_range,
            min_price: q.min_price,
            max_price: q.max_price,
            included,
            practical: PracticalFilter {
                cards_accepted: q.cards_accepted,
                parking: q.parking,
                quick_service: q.quick_service,
                group_friendly: q.group_friendly,
                near_metro: q.near_metro,
            },
            min_rating: q.min_rating.filter(|r| *r > 0.0),
            min_google_rating: q.min_google_rating.filter(|r| *r > 0.0),
            has_menu_reviews: q.has_menu_reviews.unwrap_or(false),
            open_now: q.open_now.unwrap_or(false),
            last_updated_days: q.last_updated_days,
            sort_by: q.sort_by.unwrap_or_default(),
            sort_order: q.sort_order.unwrap_or_default(),
            page: q.page.unwrap_or(1),
            limit: q.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        })
    }
}

/// A restaurant as returned by listings, annotated for the current request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantHit {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    pub is_open_now: bool,
    pub price_category: PriceCategory,
}

impl RestaurantHit {
    pub fn new(restaurant: Restaurant, distance: Option<f64>, at: NaiveDateTime) -> Self {
        Self {
            is_open_now: is_open_at(&restaurant.hours, at),
            price_category: PriceCategory::from_price(restaurant.menu_price),
            restaurant,
            distance,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Cuts one 1-based page out of an already ordered list.
pub fn paginate<T>(items: Vec<T>, page: usize, limit: usize) -> Page<T> {
    let limit = limit.clamp(1, MAX_PAGE_SIZE);
    let page = page.max(1);
    let total = items.len();
    let total_pages = total.div_ceil(limit);

    let items: Vec<T> = items
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();

    Page {
        items,
        total,
        page,
        limit,
        total_pages,
        has_next: page < total_pages,
        has_prev: page > 1,
    }
}

/// Great-circle distance in kilometres.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

fn weekday_key(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

fn hhmm(s: &str) -> Option<u32> {
    s.trim().replace(':', "").parse().ok()
}

/// Whether the weekly hours cover the given local time. Slot bounds are inclusive.
pub fn is_open_at(hours: &WeeklyHours, at: NaiveDateTime) -> bool {
    let Some(today) = hours.get(weekday_key(at.weekday())) else {
        return false;
    };
    if today.trim().eq_ignore_ascii_case("closed") {
        return false;
    }

    let now = at.hour() * 100 + at.minute();
    today.split(',').any(|slot| match slot.split_once('-') {
        Some((start, end)) => match (hhmm(start), hhmm(end)) {
            (Some(start), Some(end)) => start <= now && now <= end,
            _ => false,
        },
        None => false,
    })
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn matches_text(r: &Restaurant, needle: &str) -> bool {
    contains_ci(&r.name, needle)
        || r.description.as_deref().is_some_and(|d| contains_ci(d, needle))
        || contains_ci(&r.address, needle)
        || contains_ci(&r.district, needle)
        || contains_ci(&r.city, needle)
        || r.dishes.iter().any(|d| contains_ci(d, needle))
}

fn matches_price(r: &Restaurant, params: &SearchParams) -> bool {
    match params.price_range {
        Some(category) => category.contains(r.menu_price),
        None => {
            params.min_price.map_or(true, |min| r.menu_price >= min)
                && params.max_price.map_or(true, |max| r.menu_price <= max)
        }
    }
}

fn compare_hits(a: &RestaurantHit, b: &RestaurantHit, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::Rating => {
            let ra = a.restaurant.display_rating().unwrap_or(0.0);
            let rb = b.restaurant.display_rating().unwrap_or(0.0);
            ra.total_cmp(&rb)
        }
        SortBy::Price => a.restaurant.menu_price.total_cmp(&b.restaurant.menu_price),
        SortBy::Distance => a
            .distance
            .unwrap_or(f64::INFINITY)
            .total_cmp(&b.distance.unwrap_or(f64::INFINITY)),
        SortBy::Name => a
            .restaurant
            .name
            .to_lowercase()
            .cmp(&b.restaurant.name.to_lowercase()),
    }
}

/// Filters, annotates and orders restaurants. `now` drives the open-now and
/// freshness predicates; the local wall time of `now` is used for opening hours.
pub fn filter_and_sort<Tz: TimeZone>(
    restaurants: &[Restaurant],
    params: &SearchParams,
    now: &DateTime<Tz>,
) -> Vec<RestaurantHit> {
    let local = now.naive_local();
    let now_utc = now.with_timezone(&Utc);
    let query = params.query.as_deref().map(str::to_lowercase);
    let location = params.location.as_deref().map(str::to_lowercase);
    // A window reaching past the representable range keeps everything.
    let freshness_cutoff = params.last_updated_days.and_then(|days| {
        Duration::try_days(days.max(0)).and_then(|window| now_utc.checked_sub_signed(window))
    });

    let mut hits: Vec<RestaurantHit> = restaurants
        .iter()
        .filter_map(|r| {
            let distance = match (params.user_location, r.coordinates) {
                (Some(origin), Some(coords)) => {
                    let d = haversine_km(origin, coords);
                    if d > params.max_distance.unwrap_or(DEFAULT_MAX_DISTANCE_KM) {
                        return None;
                    }
                    Some(d)
                }
                (Some(_), None) => return None,
                (None, _) => None,
            };

            if let Some(needle) = &query {
                if !matches_text(r, needle) {
                    return None;
                }
            }
            if let Some(needle) = &location {
                if !(contains_ci(&r.city, needle)
                    || contains_ci(&r.district, needle)
                    || contains_ci(&r.address, needle))
                {
                    return None;
                }
            }
            if !matches_price(r, params) {
                return None;
            }
            if !params.food_types.is_empty() && !params.food_types.contains(&r.food_type) {
                return None;
            }
            if !params.included.is_subset(&r.whats_included) {
                return None;
            }
            if !params.practical.matches(r) {
                return None;
            }
            if let Some(min) = params.min_rating {
                if r.display_rating().map_or(true, |rating| rating < min) {
                    return None;
                }
            }
            if let Some(min) = params.min_google_rating {
                if r.google_rating.map_or(true, |rating| rating < min) {
                    return None;
                }
            }
            if params.has_menu_reviews && r.menu_reviews == 0 {
                return None;
            }
            if let Some(cutoff) = freshness_cutoff {
                if r.last_updated < cutoff {
                    return None;
                }
            }
            if params.open_now && !is_open_at(&r.hours, local) {
                return None;
            }

            Some(RestaurantHit::new(r.clone(), distance, local))
        })
        .collect();

    let sort_by = params.sort_by;
    match params.sort_order {
        SortOrder::Asc => hits.sort_by(|a, b| compare_hits(a, b, sort_by)),
        SortOrder::Desc => hits.sort_by(|a, b| compare_hits(b, a, sort_by)),
    }
    hits
}

/// The whole pipeline: filter, sort, then paginate.
pub fn search<Tz: TimeZone>(
    restaurants: &[Restaurant],
    params: &SearchParams,
    now: &DateTime<Tz>,
) -> Page<RestaurantHit> {
    paginate(filter_and_sort(restaurants, params, now), params.page, params.limit)
}

fn similarity(a: &Restaurant, b: &Restaurant) -> u32 {
    let mut score = 0;
    if a.food_type == b.food_type {
        score += 3;
    }
    let price_diff = (a.menu_price - b.menu_price).abs();
    if price_diff <= 2.0 {
        score += 2;
    } else if price_diff <= 4.0 {
        score += 1;
    }
    if a.city == b.city {
        score += 2;
    }
    let rating_diff =
        (a.display_rating().unwrap_or(0.0) - b.display_rating().unwrap_or(0.0)).abs();
    if rating_diff <= 0.5 {
        score += 1;
    }
    score
}

/// Restaurants most alike `target`, best first.
pub fn similar<'a>(restaurants: &'a [Restaurant], target: &Restaurant, limit: usize) -> Vec<&'a Restaurant> {
    let mut scored: Vec<(u32, &Restaurant)> = restaurants
        .iter()
        .filter(|r| r.id != target.id)
        .map(|r| (similarity(target, r), r))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(limit).map(|(_, r)| r).collect()
}

pub const FEATURED_MIN_RATING: f64 = 4.0;
pub const FEATURED_MIN_REVIEWS: i64 = 50;

/// Well rated restaurants with plenty of reviews, ordered by rating times reviews.
pub fn featured(restaurants: &[Restaurant], limit: usize) -> Vec<&Restaurant> {
    let weight = |r: &Restaurant| r.display_rating().unwrap_or(0.0) * r.total_reviews() as f64;

    let mut picks: Vec<&Restaurant> = restaurants
        .iter()
        .filter(|r| {
            r.display_rating().is_some_and(|rating| rating >= FEATURED_MIN_RATING)
                && r.total_reviews() >= FEATURED_MIN_REVIEWS
        })
        .collect();
    picks.sort_by(|a, b| weight(b).total_cmp(&weight(a)));
    picks.truncate(limit);
    picks
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Facets {
    pub food_types: Vec<String>,
    pub cities: Vec<String>,
}

pub fn facets(restaurants: &[Restaurant]) -> Facets {
    let food_types: BTreeSet<&str> = restaurants.iter().map(|r| r.food_type.as_str()).collect();
    let cities: BTreeSet<&str> = restaurants.iter().map(|r| r.city.as_str()).collect();
    Facets {
        food_types: food_types.into_iter().map(String::from).collect(),
        cities: cities.into_iter().map(String::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListingStatus, PracticalInfo};
    use chrono::NaiveDate;

    fn restaurant(id: i64, name: &str, price: f64) -> Restaurant {
        Restaurant {
            id,
            name: name.to_string(),
            address: format!("Rua {id}, Porto"),
            city: "Porto".to_string(),
            district: "Cedofeita".to_string(),
            coordinates: None,
            menu_price: price,
            price_range: PriceCategory::from_price(price),
            food_type: "Traditional Portuguese".to_string(),
            whats_included: BTreeSet::new(),
            practical: PracticalInfo::default(),
            google_rating: None,
            google_reviews: None,
            menu_rating: 0.0,
            menu_reviews: 0,
            description: None,
            dishes: Vec::new(),
            photos: Vec::new(),
            restaurant_photo: None,
            menu_photo: None,
            hours: WeeklyHours::new(),
            status: ListingStatus::Approved,
            submitted_by: None,
            submitted_at: None,
            approved_by: None,
            approved_at: None,
            last_updated: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        }
    }

    fn now() -> DateTime<Utc> {
        // A Wednesday.
        Utc.with_ymd_and_hms(2024, 6, 5, 13, 30, 0).unwrap()
    }

    fn ids(hits: &[RestaurantHit]) -> Vec<i64> {
        hits.iter().map(|h| h.restaurant.id).collect()
    }

    #[test]
    fn explicit_price_bounds_are_inclusive() {
        let list = vec![
            restaurant(1, "A", 7.0),
            restaurant(2, "B", 8.5),
            restaurant(3, "C", 10.0),
            restaurant(4, "D", 12.0),
        ];
        let params = SearchParams {
            min_price: Some(8.0),
            max_price: Some(10.0),
            sort_by: SortBy::Price,
            sort_order: SortOrder::Asc,
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(&list, &params, &now())), vec![2, 3]);
    }

    #[test]
    fn price_bucket_takes_precedence_over_bounds() {
        let list = vec![restaurant(1, "A", 5.0), restaurant(2, "B", 7.5), restaurant(3, "C", 9.0)];
        let params = SearchParams {
            price_range: Some(PriceCategory::Budget),
            min_price: Some(9.0),
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(&list, &params, &now())), vec![2]);
    }

    #[test]
    fn results_are_a_subset_that_satisfies_every_predicate() {
        let mut a = restaurant(1, "Tasca do Zé", 9.0);
        a.dishes = vec!["Francesinha".into()];
        a.whats_included = [Inclusion::Soup, Inclusion::Coffee].into_iter().collect();
        a.practical.cards_accepted = true;
        let mut b = restaurant(2, "Sushi Bar", 9.0);
        b.food_type = "Japanese".into();
        let mut c = restaurant(3, "Casa Francesinha", 14.0);
        c.whats_included = [Inclusion::Soup].into_iter().collect();

        let list = vec![a, b, c];
        let params = SearchParams {
            query: Some("francesinha".into()),
            food_types: ["Traditional Portuguese".to_string()].into_iter().collect(),
            included: [Inclusion::Soup].into_iter().collect(),
            ..Default::default()
        };
        let hits = filter_and_sort(&list, &params, &now());
        assert_eq!(ids(&hits), vec![1, 3]);
        assert!(hits.iter().all(|h| list.contains(&h.restaurant)));

        let params = SearchParams {
            practical: PracticalFilter {
                cards_accepted: Some(true),
                ..Default::default()
            },
            ..params
        };
        assert_eq!(ids(&filter_and_sort(&list, &params, &now())), vec![1]);
    }

    #[test]
    fn min_rating_uses_display_rating_and_skips_unrated() {
        let mut reviewed = restaurant(1, "A", 9.0);
        reviewed.menu_rating = 3.5;
        reviewed.menu_reviews = 4;
        reviewed.google_rating = Some(4.8);
        let mut google_only = restaurant(2, "B", 9.0);
        google_only.google_rating = Some(4.2);
        let unrated = restaurant(3, "C", 9.0);

        let list = vec![reviewed, google_only, unrated];
        let params = SearchParams {
            min_rating: Some(4.0),
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(&list, &params, &now())), vec![2]);
    }

    #[test]
    fn geo_filter_attaches_distance_and_drops_unlocated() {
        let mut near = restaurant(1, "Near", 9.0);
        near.coordinates = Some(Coordinates { lat: 41.1496, lng: -8.6109 });
        let mut far = restaurant(2, "Far", 9.0);
        far.coordinates = Some(Coordinates { lat: 38.7223, lng: -9.1393 });
        let unlocated = restaurant(3, "Nowhere", 9.0);

        let list = vec![far, near, unlocated];
        let params = SearchParams {
            user_location: Some(Coordinates { lat: 41.1579, lng: -8.6291 }),
            sort_by: SortBy::Distance,
            sort_order: SortOrder::Asc,
            ..Default::default()
        };
        let hits = filter_and_sort(&list, &params, &now());
        assert_eq!(ids(&hits), vec![1]);
        assert!(hits[0].distance.is_some_and(|d| d < 5.0));
    }

    #[test]
    fn haversine_porto_to_lisbon() {
        let porto = Coordinates { lat: 41.1579, lng: -8.6291 };
        let lisbon = Coordinates { lat: 38.7223, lng: -9.1393 };
        let d = haversine_km(porto, lisbon);
        assert!((d - 274.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn opening_hours_are_inclusive() {
        let mut hours = WeeklyHours::new();
        hours.insert("wednesday".into(), "12:00-15:00,19:00-22:30".into());
        hours.insert("thursday".into(), "closed".into());

        let at = |h, m| NaiveDate::from_ymd_opt(2024, 6, 5).unwrap().and_hms_opt(h, m, 0).unwrap();
        assert!(is_open_at(&hours, at(12, 0)));
        assert!(is_open_at(&hours, at(22, 30)));
        assert!(!is_open_at(&hours, at(16, 0)));

        let thursday = NaiveDate::from_ymd_opt(2024, 6, 6).unwrap().and_hms_opt(13, 0, 0).unwrap();
        assert!(!is_open_at(&hours, thursday));
    }

    #[test]
    fn freshness_window() {
        let mut stale = restaurant(1, "Old", 9.0);
        stale.last_updated = now() - Duration::days(40);
        let mut fresh = restaurant(2, "New", 9.0);
        fresh.last_updated = now() - Duration::days(2);

        let params = SearchParams {
            last_updated_days: Some(30),
            ..Default::default()
        };
        assert_eq!(ids(&filter_and_sort(&[stale, fresh], &params, &now())), vec![2]);
    }

    #[test]
    fn huge_freshness_window_keeps_everything() {
        let mut stale = restaurant(1, "Old", 9.0);
        stale.last_updated = now() - Duration::days(4000);
        let params = SearchParams::try_from(SearchQuery {
            last_updated_days: Some(9_000_000_000_000),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(ids(&filter_and_sort(&[stale], &params, &now())), vec![1]);

        let near_limit = SearchParams {
            last_updated_days: Some(i64::MAX / 86_400_000),
            ..Default::default()
        };
        assert!(filter_and_sort(&[], &near_limit, &now()).is_empty());
    }

    #[test]
    fn negative_freshness_window_is_rejected() {
        let result = SearchParams::try_from(SearchQuery {
            last_updated_days: Some(-1),
            ..Default::default()
        });
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn default_sort_is_rating_desc_and_stable() {
        let mut a = restaurant(1, "A", 9.0);
        a.google_rating = Some(4.0);
        let mut b = restaurant(2, "B", 9.0);
        b.google_rating = Some(4.5);
        let mut c = restaurant(3, "C", 9.0);
        c.google_rating = Some(4.0);

        let hits = filter_and_sort(&[a, b, c], &SearchParams::default(), &now());
        assert_eq!(ids(&hits), vec![2, 1, 3]);
    }

    #[test]
    fn pagination_clamps_limit() {
        let page = paginate((1..=45).collect::<Vec<_>>(), 3, 20);
        assert_eq!(page.items, (41..=45).collect::<Vec<_>>());
        assert_eq!(page.total_pages, 3);
        assert!(!page.has_next);
        assert!(page.has_prev);

        let page = paginate(vec![1, 2, 3], 1, 0);
        assert_eq!(page.limit, 1);
        assert_eq!(page.items, vec![1]);

        let page = paginate(Vec::<i32>::new(), 1, 20);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next && !page.has_prev);
    }

    #[test]
    fn query_string_conversion() {
        let q = SearchQuery {
            food_types: Some("Japanese, Italian".into()),
            included: Some("soup,coffee".into()),
            price_range: Some("any".into()),
            ..Default::default()
        };
        let params = SearchParams::try_from(q).unwrap();
        assert_eq!(params.food_types.len(), 2);
        assert!(params.included.contains(&Inclusion::Coffee));
        assert_eq!(params.price_range, None);
        assert_eq!(params.limit, DEFAULT_PAGE_SIZE);

        let q = SearchQuery {
            lat: Some(41.0),
            ..Default::default()
        };
        assert!(SearchParams::try_from(q).is_err());
    }

    #[test]
    fn similar_scores_food_price_city_and_rating() {
        let target = restaurant(1, "Target", 9.0);
        let mut same = restaurant(2, "Same", 10.0);
        same.google_rating = None;
        let mut other = restaurant(3, "Other", 20.0);
        other.food_type = "Japanese".into();
        other.city = "Lisboa".into();
        other.google_rating = Some(4.9);

        let list = vec![target.clone(), other, same];
        let ranked: Vec<i64> = similar(&list, &target, 4).iter().map(|r| r.id).collect();
        assert_eq!(ranked, vec![2, 3]);
    }

    #[test]
    fn featured_requires_rating_and_review_volume() {
        let mut popular = restaurant(1, "Popular", 9.0);
        popular.google_rating = Some(4.5);
        popular.google_reviews = Some(300);
        let mut niche = restaurant(2, "Niche", 9.0);
        niche.google_rating = Some(4.9);
        niche.google_reviews = Some(10);
        let mut solid = restaurant(3, "Solid", 9.0);
        solid.google_rating = Some(4.1);
        solid.google_reviews = Some(80);

        let list = vec![solid, niche, popular];
        let ranked: Vec<i64> = featured(&list, 6).iter().map(|r| r.id).collect();
        assert_eq!(ranked, vec![1, 3]);
    }

    #[test]
    fn facets_are_sorted_and_unique() {
        let mut b = restaurant(2, "B", 9.0);
        b.city = "Lisboa".into();
        let f = facets(&[restaurant(1, "A", 9.0), b, restaurant(3, "C", 9.0)]);
        assert_eq!(f.cities, vec!["Lisboa".to_string(), "Porto".to_string()]);
        assert_eq!(f.food_types, vec!["Traditional Portuguese".to_string()]);
    }
}
