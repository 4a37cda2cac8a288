use chrono::Utc;
use leptos::logging::log;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashMap;

use super::{json_column, parsed_column, to_json, Database};
use crate::error::AppError;
use crate::models::{
    Coordinates, ListingStatus, PriceCategory, Restaurant, RestaurantDraft, Submission,
};
use crate::rating::average_rating;

const RESTAURANT_COLUMNS: &str = "id, name, address, city, district, lat, lng, menu_price, food_type,
    whats_included, practical, google_rating, google_reviews, description, dishes, photos,
    restaurant_photo, menu_photo, hours, status, submitted_by, submitted_at, approved_by,
    approved_at, last_updated";

fn restaurant_from_row(row: &Row<'_>) -> rusqlite::Result<Restaurant> {
    let lat: Option<f64> = row.get(5)?;
    let lng: Option<f64> = row.get(6)?;
    let menu_price: f64 = row.get(7)?;
    Ok(Restaurant {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        city: row.get(3)?,
        district: row.get(4)?,
        coordinates: lat.zip(lng).map(|(lat, lng)| Coordinates { lat, lng }),
        menu_price,
        price_range: PriceCategory::from_price(menu_price),
        food_type: row.get(8)?,
        whats_included: json_column(row, 9)?,
        practical: json_column(row, 10)?,
        google_rating: row.get(11)?,
        google_reviews: row.get(12)?,
        menu_rating: 0.0,
        menu_reviews: 0,
        description: row.get(13)?,
        dishes: json_column(row, 14)?,
        photos: json_column(row, 15)?,
        restaurant_photo: row.get(16)?,
        menu_photo: row.get(17)?,
        hours: json_column(row, 18)?,
        status: parsed_column(row, 19, |s| s.parse().ok())?,
        submitted_by: row.get(20)?,
        submitted_at: row.get(21)?,
        approved_by: row.get(22)?,
        approved_at: row.get(23)?,
        last_updated: row.get(24)?,
    })
}

/// Bound on the ids bound into one `IN (...)` list.
const RATING_BATCH: usize = 500;

/// Fills `menu_rating` and `menu_reviews` from the visible reviews of the
/// given restaurants.
fn attach_ratings(conn: &Connection, restaurants: &mut [Restaurant]) -> Result<(), AppError> {
    let ids: Vec<i64> = restaurants.iter().map(|r| r.id).collect();
    let mut ratings: HashMap<i64, Vec<f64>> = HashMap::new();

    for batch in ids.chunks(RATING_BATCH) {
        let placeholders = vec!["?"; batch.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT restaurant_id, rating FROM reviews
             WHERE is_hidden = 0 AND restaurant_id IN ({placeholders})"
        ))?;
        let rows = stmt.query_map(params_from_iter(batch.iter()), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?))
        })?;
        for row in rows {
            let (restaurant_id, rating) = row?;
            ratings.entry(restaurant_id).or_default().push(rating);
        }
    }

    for restaurant in restaurants.iter_mut() {
        if let Some(list) = ratings.get(&restaurant.id) {
            restaurant.menu_reviews = list.len() as i64;
            restaurant.menu_rating = average_rating(list.iter().copied());
        }
    }
    Ok(())
}

pub(super) fn load_restaurant(conn: &Connection, id: i64) -> Result<Option<Restaurant>, AppError> {
    let restaurant = conn
        .query_row(
            &format!("SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE id = ?1"),
            [id],
            restaurant_from_row,
        )
        .optional()?;

    match restaurant {
        Some(r) => {
            let mut one = [r];
            attach_ratings(conn, &mut one)?;
            let [r] = one;
            Ok(Some(r))
        }
        None => Ok(None),
    }
}

pub(super) fn insert_restaurant(conn: &Connection, r: &Restaurant) -> Result<i64, AppError> {
    conn.execute(
        "INSERT INTO restaurants (name, address, city, district, lat, lng, menu_price, food_type,
            whats_included, practical, google_rating, google_reviews, description, dishes, photos,
            restaurant_photo, menu_photo, hours, status, submitted_by, submitted_at, approved_by,
            approved_at, last_updated)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18,
            ?19, ?20, ?21, ?22, ?23, ?24)",
        params![
            r.name,
            r.address,
            r.city,
            r.district,
            r.coordinates.map(|c| c.lat),
            r.coordinates.map(|c| c.lng),
            r.menu_price,
            r.food_type,
            to_json(&r.whats_included)?,
            to_json(&r.practical)?,
            r.google_rating,
            r.google_reviews,
            r.description,
            to_json(&r.dishes)?,
            to_json(&r.photos)?,
            r.restaurant_photo,
            r.menu_photo,
            to_json(&r.hours)?,
            r.status.as_str(),
            r.submitted_by,
            r.submitted_at,
            r.approved_by,
            r.approved_at,
            r.last_updated,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(super) fn update_restaurant(conn: &Connection, r: &Restaurant) -> Result<(), AppError> {
    conn.execute(
        "UPDATE restaurants SET name = ?1, address = ?2, city = ?3, district = ?4, lat = ?5,
            lng = ?6, menu_price = ?7, food_type = ?8, whats_included = ?9, practical = ?10,
            google_rating = ?11, google_reviews = ?12, description = ?13, dishes = ?14,
            photos = ?15, restaurant_photo = ?16, menu_photo = ?17, hours = ?18,
            last_updated = ?19
         WHERE id = ?20",
        params![
            r.name,
            r.address,
            r.city,
            r.district,
            r.coordinates.map(|c| c.lat),
            r.coordinates.map(|c| c.lng),
            r.menu_price,
            r.food_type,
            to_json(&r.whats_included)?,
            to_json(&r.practical)?,
            r.google_rating,
            r.google_reviews,
            r.description,
            to_json(&r.dishes)?,
            to_json(&r.photos)?,
            r.restaurant_photo,
            r.menu_photo,
            to_json(&r.hours)?,
            r.last_updated,
            r.id,
        ],
    )?;
    Ok(())
}

impl Database {
    /// All approved listings with their aggregated menu ratings.
    pub async fn list_restaurants(&self) -> Result<Vec<Restaurant>, AppError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE status = ?1 ORDER BY id"
        ))?;
        let rows = stmt.query_map([ListingStatus::Approved.as_str()], restaurant_from_row)?;

        let mut restaurants = Vec::new();
        for row in rows {
            restaurants.push(row?);
        }
        attach_ratings(&conn, &mut restaurants)?;
        Ok(restaurants)
    }

    pub async fn get_restaurant(&self, id: i64) -> Result<Restaurant, AppError> {
        let conn = self.conn.lock().await;
        load_restaurant(&conn, id)?.ok_or_else(|| AppError::not_found(format!("Restaurant {id}")))
    }

    pub(super) async fn insert_restaurant_from_draft(
        &self,
        draft: &RestaurantDraft,
        submitter: &str,
    ) -> Result<i64, AppError> {
        draft.validate()?;
        let now = Utc::now();
        let submission = Submission {
            id: 0,
            restaurant_name: draft.name.clone(),
            submitted_by: submitter.to_string(),
            submitted_at: now,
            status: ListingStatus::Pending,
            data: draft.clone(),
            reviewer_comments: Vec::new(),
            reviewed_by: None,
            reviewed_at: None,
            restaurant_id: None,
        };
        let restaurant = submission.to_restaurant(0, submitter, now);

        let conn = self.conn.lock().await;
        let id = insert_restaurant(&conn, &restaurant)?;
        log!("[DB] Inserted restaurant {} '{}'", id, restaurant.name);
        Ok(id)
    }

    /// Deletes a listing together with its reviews, votes, reports,
    /// edit suggestions and favorites.
    pub async fn delete_restaurant(&self, id: i64) -> Result<(), AppError> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let deleted = tx.execute("DELETE FROM restaurants WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(AppError::not_found(format!("Restaurant {id}")));
        }
        tx.execute(
            "UPDATE submissions SET restaurant_id = NULL WHERE restaurant_id = ?1",
            [id],
        )?;
        tx.commit()?;
        log!("[DB] Deleted restaurant {}", id);
        Ok(())
    }

    pub async fn list_favorites(&self, user_id: i64) -> Result<Vec<Restaurant>, AppError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT r.id, r.name, r.address, r.city, r.district, r.lat, r.lng, r.menu_price,
                r.food_type, r.whats_included, r.practical, r.google_rating, r.google_reviews,
                r.description, r.dishes, r.photos, r.restaurant_photo, r.menu_photo, r.hours,
                r.status, r.submitted_by, r.submitted_at, r.approved_by, r.approved_at,
                r.last_updated
             FROM favorites f JOIN restaurants r ON r.id = f.restaurant_id
             WHERE f.user_id = ?1
             ORDER BY r.name",
        )?;
        let rows = stmt.query_map([user_id], restaurant_from_row)?;

        let mut restaurants = Vec::new();
        for row in rows {
            restaurants.push(row?);
        }
        attach_ratings(&conn, &mut restaurants)?;
        Ok(restaurants)
    }

    pub async fn add_favorite(&self, user_id: i64, restaurant_id: i64) -> Result<(), AppError> {
        let conn = self.conn.lock().await;
        if load_restaurant(&conn, restaurant_id)?.is_none() {
            return Err(AppError::not_found(format!("Restaurant {restaurant_id}")));
        }
        conn.execute(
            "INSERT OR IGNORE INTO favorites (user_id, restaurant_id) VALUES (?1, ?2)",
            params![user_id, restaurant_id],
        )?;
        Ok(())
    }

    /// Returns false when the restaurant was not a favorite.
    pub async fn remove_favorite(&self, user_id: i64, restaurant_id: i64) -> Result<bool, AppError> {
        let conn = self.conn.lock().await;
        let removed = conn.execute(
            "DELETE FROM favorites WHERE user_id = ?1 AND restaurant_id = ?2",
            params![user_id, restaurant_id],
        )?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::tests::{create_test_db, create_test_user, draft};
    use crate::models::{Inclusion, PriceCategory};

    #[tokio::test]
    async fn test_restaurant_round_trip() {
        let db = create_test_db().await;
        let id = db
            .insert_restaurant_from_draft(&draft("Tasca do Zé", 9.5), "ana@example.pt")
            .await
            .unwrap();

        let r = db.get_restaurant(id).await.unwrap();
        assert_eq!(r.name, "Tasca do Zé");
        assert_eq!(r.city, "Porto");
        assert_eq!(r.district, "Ribeira");
        assert_eq!(r.price_range, PriceCategory::Standard);
        assert!(r.whats_included.contains(&Inclusion::Soup));
        assert_eq!(r.menu_rating, 0.0);
        assert_eq!(r.menu_reviews, 0);
        assert_eq!(r.submitted_by.as_deref(), Some("ana@example.pt"));
    }

    #[tokio::test]
    async fn test_missing_restaurant_is_not_found() {
        let db = create_test_db().await;
        let err = db.get_restaurant(404).await.unwrap_err();
        assert!(matches!(err, crate::error::AppError::NotFound(_)));
        assert!(db.delete_restaurant(404).await.is_err());
    }

    #[tokio::test]
    async fn test_favorites_are_a_set() {
        let db = create_test_db().await;
        let ana = create_test_user(&db, "Ana", "ana@example.pt").await;
        let id = db
            .insert_restaurant_from_draft(&draft("Tasca", 9.0), "ana@example.pt")
            .await
            .unwrap();

        db.add_favorite(ana.id, id).await.unwrap();
        db.add_favorite(ana.id, id).await.unwrap();
        assert_eq!(db.list_favorites(ana.id).await.unwrap().len(), 1);

        assert!(db.remove_favorite(ana.id, id).await.unwrap());
        assert!(!db.remove_favorite(ana.id, id).await.unwrap());
        assert!(db.add_favorite(ana.id, 999).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_cascades_to_reviews_and_favorites() {
        let db = create_test_db().await;
        let ana = create_test_user(&db, "Ana", "ana@example.pt").await;
        let id = db
            .insert_restaurant_from_draft(&draft("Tasca", 9.0), "ana@example.pt")
            .await
            .unwrap();
        db.add_favorite(ana.id, id).await.unwrap();
        db.create_review(id, &ana, 4.0, "Bom").await.unwrap();

        db.delete_restaurant(id).await.unwrap();

        assert!(db.list_favorites(ana.id).await.unwrap().is_empty());
        assert!(db.reviews_by_user(ana.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rating_counts_only_own_visible_reviews() {
        let db = create_test_db().await;
        let ana = create_test_user(&db, "Ana", "ana@example.pt").await;
        let rui = create_test_user(&db, "Rui", "rui@example.pt").await;
        let tasca = db
            .insert_restaurant_from_draft(&draft("Tasca", 9.0), "ana@example.pt")
            .await
            .unwrap();
        let other = db
            .insert_restaurant_from_draft(&draft("Outra", 11.0), "ana@example.pt")
            .await
            .unwrap();

        db.create_review(tasca, &ana, 4.0, "Bom").await.unwrap();
        db.create_review(other, &ana, 1.0, "Fraco").await.unwrap();
        let hidden = db.create_review(tasca, &rui, 2.0, "Frio").await.unwrap();
        {
            let conn = db.conn.lock().await;
            conn.execute("UPDATE reviews SET is_hidden = 1 WHERE id = ?1", [hidden.id])
                .unwrap();
        }

        let r = db.get_restaurant(tasca).await.unwrap();
        assert_eq!(r.menu_reviews, 1);
        assert_eq!(r.menu_rating, 4.0);

        let all = db.list_restaurants().await.unwrap();
        let listed = all.iter().find(|r| r.id == other).unwrap();
        assert_eq!(listed.menu_reviews, 1);
        assert_eq!(listed.menu_rating, 1.0);
    }
}
