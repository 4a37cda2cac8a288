use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::Review;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ReviewSort {
    #[default]
    Recent,
    Upvotes,
    Rating,
    LowestRating,
    Controversial,
}

impl ReviewSort {
    /// Unknown names fall back to the most recent first.
    pub fn from_param(s: &str) -> Self {
        match s {
            "upvotes" => ReviewSort::Upvotes,
            "rating" => ReviewSort::Rating,
            "lowestRating" | "lowest_rating" => ReviewSort::LowestRating,
            "controversial" => ReviewSort::Controversial,
            _ => ReviewSort::Recent,
        }
    }
}

// Distance from an even split of up and down votes.
fn imbalance(review: &Review) -> f64 {
    let engagement = review.engagement();
    let share = review.upvotes as f64 / engagement.max(1) as f64;
    (0.5 - share).abs()
}

fn compare(sort: ReviewSort, a: &Review, b: &Review) -> Ordering {
    match sort {
        ReviewSort::Recent => b.created_at.cmp(&a.created_at),
        ReviewSort::Upvotes => b.net_score().cmp(&a.net_score()),
        ReviewSort::Rating => b
            .rating
            .total_cmp(&a.rating)
            .then_with(|| b.net_score().cmp(&a.net_score())),
        ReviewSort::LowestRating => a
            .rating
            .total_cmp(&b.rating)
            .then_with(|| (b.downvotes - b.upvotes).cmp(&(a.downvotes - a.upvotes))),
        ReviewSort::Controversial => b
            .engagement()
            .cmp(&a.engagement())
            .then_with(|| imbalance(a).total_cmp(&imbalance(b))),
    }
}

/// Orders reviews in place. Ties keep their input order.
pub fn sort_reviews(reviews: &mut [Review], sort: ReviewSort) {
    reviews.sort_by(|a, b| compare(sort, a, b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn review(id: i64, rating: f64, up: i64, down: i64, age_days: i64) -> Review {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        Review {
            id,
            restaurant_id: 1,
            user_id: format!("user{id}@example.pt"),
            display_name: format!("User{id}"),
            rating,
            comment: String::new(),
            upvotes: up,
            downvotes: down,
            created_at: base - Duration::days(age_days),
            is_hidden: false,
            current_user_vote: None,
        }
    }

    fn ids(reviews: &[Review]) -> Vec<i64> {
        reviews.iter().map(|r| r.id).collect()
    }

    #[test]
    fn recent_puts_newest_first() {
        let mut list = vec![review(1, 4.0, 0, 0, 3), review(2, 4.0, 0, 0, 1), review(3, 4.0, 0, 0, 2)];
        sort_reviews(&mut list, ReviewSort::Recent);
        assert_eq!(ids(&list), vec![2, 3, 1]);
    }

    #[test]
    fn upvotes_is_non_increasing_in_net_score() {
        let mut list = vec![
            review(1, 3.0, 1, 4, 0),
            review(2, 3.0, 6, 1, 0),
            review(3, 3.0, 2, 2, 0),
            review(4, 3.0, 9, 0, 0),
        ];
        sort_reviews(&mut list, ReviewSort::Upvotes);
        assert!(list.windows(2).all(|w| w[0].net_score() >= w[1].net_score()));
        assert_eq!(ids(&list), vec![4, 2, 3, 1]);
    }

    #[test]
    fn rating_breaks_ties_on_net_score() {
        let mut list = vec![review(1, 4.5, 1, 0, 0), review(2, 5.0, 0, 0, 0), review(3, 4.5, 5, 0, 0)];
        sort_reviews(&mut list, ReviewSort::Rating);
        assert_eq!(ids(&list), vec![2, 3, 1]);
    }

    #[test]
    fn lowest_rating_puts_downvote_heavy_first() {
        let mut list = vec![review(1, 2.0, 3, 0, 0), review(2, 2.0, 0, 3, 0), review(3, 4.0, 0, 0, 0)];
        sort_reviews(&mut list, ReviewSort::LowestRating);
        assert_eq!(ids(&list), vec![2, 1, 3]);
    }

    #[test]
    fn controversial_prefers_balanced_votes() {
        let mut list = vec![review(1, 3.0, 5, 1, 0), review(2, 3.0, 3, 3, 0)];
        sort_reviews(&mut list, ReviewSort::Controversial);
        assert_eq!(ids(&list), vec![2, 1]);
    }

    #[test]
    fn ties_keep_input_order() {
        let mut list = vec![review(7, 4.0, 1, 1, 0), review(3, 4.0, 1, 1, 0), review(5, 4.0, 1, 1, 0)];
        sort_reviews(&mut list, ReviewSort::Controversial);
        assert_eq!(ids(&list), vec![7, 3, 5]);
    }

    #[test]
    fn unknown_sort_falls_back_to_recent() {
        assert_eq!(ReviewSort::from_param("lowestRating"), ReviewSort::LowestRating);
        assert_eq!(ReviewSort::from_param("nonsense"), ReviewSort::Recent);
    }
}
