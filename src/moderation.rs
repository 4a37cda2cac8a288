use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AppError;
use crate::models::report::NewReport;
use crate::models::reviewer_application::{ApplicationDecision, NewApplication};
use crate::models::{
    ChangeSet, DecisionStatus, EditSuggestion, ListingStatus, PriceCategory, Report,
    ReportAction, ReportStatus, Restaurant, RestaurantDraft, ReviewerApplication,
    ReviewerComment, Submission, SubmissionAction,
};
use crate::validation;

/// Diff keys that refer to computed values and are skipped on apply.
const DERIVED_FIELDS: [&str; 3] = ["distance", "numberOfDishes", "priceRange"];

impl Submission {
    /// Records a reviewer decision. Only pending submissions can be reviewed.
    pub fn review(
        &mut self,
        action: SubmissionAction,
        comment: &str,
        reviewer: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if self.status != ListingStatus::Pending {
            return Err(AppError::Conflict(format!(
                "submission {} is already {}",
                self.id, self.status
            )));
        }

        let comment = comment.trim();
        if !comment.is_empty() {
            self.reviewer_comments.push(ReviewerComment {
                comment: comment.to_string(),
                reviewer: reviewer.to_string(),
                timestamp: now,
            });
        }
        self.status = action.resulting_status();
        self.reviewed_by = Some(reviewer.to_string());
        self.reviewed_at = Some(now);
        Ok(())
    }

    /// Replaces the payload after a reviewer asked for changes and puts the
    /// submission back in the queue.
    pub fn resubmit(
        &mut self,
        data: RestaurantDraft,
        user_email: &str,
    ) -> Result<(), AppError> {
        if self.submitted_by != user_email {
            return Err(AppError::Forbidden(
                "only the author can update a submission".to_string(),
            ));
        }
        match self.status {
            ListingStatus::Pending | ListingStatus::NeedsChanges => {}
            status => {
                return Err(AppError::Conflict(format!(
                    "submission {} is already {status}",
                    self.id
                )))
            }
        }
        data.validate()?;

        self.restaurant_name = data.name.trim().to_string();
        self.data = data;
        self.status = ListingStatus::Pending;
        Ok(())
    }

    /// Builds the listing an approved submission turns into.
    pub fn to_restaurant(&self, id: i64, approver: &str, now: DateTime<Utc>) -> Restaurant {
        let draft = &self.data;
        let (city, district) = draft.locality();
        Restaurant {
            id,
            name: draft.name.trim().to_string(),
            address: draft.address.trim().to_string(),
            city,
            district,
            coordinates: draft.coordinates,
            menu_price: draft.menu_price,
            price_range: PriceCategory::from_price(draft.menu_price),
            food_type: draft.food_type.trim().to_string(),
            whats_included: draft.whats_included.clone(),
            practical: draft.practical,
            google_rating: draft.google_rating,
            google_reviews: draft.google_reviews,
            menu_rating: 0.0,
            menu_reviews: 0,
            description: draft.description.clone(),
            dishes: draft.dishes.clone(),
            photos: draft.photos.clone(),
            restaurant_photo: draft.restaurant_photo.clone(),
            menu_photo: draft.menu_photo.clone(),
            hours: draft.hours.clone(),
            status: ListingStatus::Approved,
            submitted_by: Some(self.submitted_by.clone()),
            submitted_at: Some(self.submitted_at),
            approved_by: Some(approver.to_string()),
            approved_at: Some(now),
            last_updated: now,
        }
    }
}

fn typed<T: DeserializeOwned>(field: &str, value: &Value) -> Result<T, AppError> {
    serde_json::from_value(value.clone())
        .map_err(|e| AppError::validation(format!("invalid value for {field}: {e}")))
}

fn required_text(field: &str, value: &Value) -> Result<String, AppError> {
    let text: String = typed(field, value)?;
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::validation(format!("{field} cannot be empty")));
    }
    Ok(text)
}

/// Patches exactly the fields named in `changes`. The restaurant is left
/// untouched if any field is unknown or carries a value of the wrong type.
/// Returns the names of the fields that were applied.
pub fn apply_changes(restaurant: &mut Restaurant, changes: &ChangeSet) -> Result<Vec<String>, AppError> {
    let mut patched = restaurant.clone();
    let mut applied = Vec::new();

    for (field, change) in changes {
        let value = change.target();
        match field.as_str() {
            "name" => patched.name = required_text(field, value)?,
            "address" => patched.address = required_text(field, value)?,
            "city" => patched.city = required_text(field, value)?,
            "district" => patched.district = required_text(field, value)?,
            "foodType" => patched.food_type = required_text(field, value)?,
            "menuPrice" => {
                let price: f64 = typed(field, value)?;
                if !(price > 0.0 && price <= 100.0) {
                    return Err(AppError::validation("menuPrice must be between 0 and 100 euros"));
                }
                patched.set_menu_price(price);
            }
            "googleRating" => {
                let rating: Option<f64> = typed(field, value)?;
                if rating.is_some_and(|r| !(0.0..=5.0).contains(&r)) {
                    return Err(AppError::validation("googleRating must be between 0 and 5"));
                }
                patched.google_rating = rating;
            }
            "googleReviews" => patched.google_reviews = typed(field, value)?,
            "description" => patched.description = typed(field, value)?,
            "dishes" => patched.dishes = typed(field, value)?,
            "photos" => patched.photos = typed(field, value)?,
            "whatsIncluded" => patched.whats_included = typed(field, value)?,
            "hours" => patched.hours = typed(field, value)?,
            "coordinates" => patched.coordinates = typed(field, value)?,
            "restaurantPhoto" => patched.restaurant_photo = typed(field, value)?,
            "menuPhoto" => patched.menu_photo = typed(field, value)?,
            "cardsAccepted" => patched.practical.cards_accepted = typed(field, value)?,
            "parking" => patched.practical.parking = typed(field, value)?,
            "quickService" => patched.practical.quick_service = typed(field, value)?,
            "groupFriendly" => patched.practical.group_friendly = typed(field, value)?,
            "nearMetro" => patched.practical.near_metro = typed(field, value)?,
            "practical" => patched.practical = typed(field, value)?,
            f if DERIVED_FIELDS.contains(&f) => continue,
            other => {
                return Err(AppError::validation(format!("unknown field '{other}'")));
            }
        }
        applied.push(field.clone());
    }

    *restaurant = patched;
    Ok(applied)
}

/// Checks a proposed diff against the current listing without changing it.
pub fn validate_changes(restaurant: &Restaurant, changes: &ChangeSet) -> Result<(), AppError> {
    if changes.is_empty() {
        return Err(AppError::validation("an edit suggestion needs at least one change"));
    }
    let mut scratch = restaurant.clone();
    apply_changes(&mut scratch, changes).map(|_| ())
}

fn ensure_pending(status: DecisionStatus, what: &str, id: i64) -> Result<(), AppError> {
    if status == DecisionStatus::Pending {
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "{what} {id} is already {}",
            status.as_str()
        )))
    }
}

impl EditSuggestion {
    /// Marks the suggestion approved. The caller applies the diff in the same transaction.
    pub fn approve(&mut self, reviewer: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        ensure_pending(self.status, "edit suggestion", self.id)?;
        self.status = DecisionStatus::Approved;
        self.reviewed_by = Some(reviewer.to_string());
        self.reviewed_at = Some(now);
        Ok(())
    }

    pub fn reject(&mut self, reason: &str, reviewer: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        ensure_pending(self.status, "edit suggestion", self.id)?;
        let reason = validation::bounded_text("reason", reason, 1, 500)?;
        self.status = DecisionStatus::Rejected;
        self.rejection_reason = Some(reason);
        self.reviewed_by = Some(reviewer.to_string());
        self.reviewed_at = Some(now);
        Ok(())
    }
}

impl NewReport {
    pub fn validated_reason(&self) -> Result<String, AppError> {
        validation::bounded_text("reason", &self.reason, 3, 500)
    }
}

impl Report {
    pub fn resolve(&mut self, action: ReportAction, resolver: &str, now: DateTime<Utc>) -> Result<(), AppError> {
        if self.status != ReportStatus::Pending {
            return Err(AppError::Conflict(format!("report {} is already resolved", self.id)));
        }
        self.status = ReportStatus::Resolved;
        self.action = Some(action);
        self.resolved_by = Some(resolver.to_string());
        self.resolved_at = Some(now);
        Ok(())
    }
}

impl NewApplication {
    /// Trimmed motivation and experience, within their length limits.
    pub fn validated(&self) -> Result<(String, Option<String>), AppError> {
        let motivation = validation::bounded_text("motivation", &self.motivation, 50, 1000)?;
        let experience = match self.experience.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => Some(validation::bounded_text("experience", text, 1, 1000)?),
        };
        Ok((motivation, experience))
    }
}

impl ReviewerApplication {
    pub fn decide(
        &mut self,
        decision: ApplicationDecision,
        admin_notes: Option<&str>,
        admin: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        ensure_pending(self.status, "application", self.id)?;
        self.admin_notes = match admin_notes.map(str::trim) {
            None | Some("") => None,
            Some(notes) => Some(validation::bounded_text("adminNotes", notes, 1, 500)?),
        };
        self.status = decision.resulting_status();
        self.reviewed_by = Some(admin.to_string());
        self.reviewed_at = Some(now);
        Ok(())
    }
}
