//! Demo data and the simulated network used by demo deployments.

use serde_json::json;

use crate::error::AppError;
use crate::models::RestaurantDraft;

fn lunch_hours() -> serde_json::Value {
    json!({
        "monday": "12:00-15:00",
        "tuesday": "12:00-15:00",
        "wednesday": "12:00-15:00",
        "thursday": "12:00-15:00",
        "friday": "12:00-15:00",
        "saturday": "12:30-15:30",
        "sunday": "closed"
    })
}

/// Restaurants loaded into an empty store when demo seeding is enabled.
/// A malformed entry fails the whole seed.
pub fn demo_restaurants() -> Result<Vec<RestaurantDraft>, AppError> {
    let raw = vec![
        json!({
            "name": "Tasca do João",
            "address": "Rua do Norte, 45, Ribeira, Porto",
            "coordinates": {"lat": 41.1413, "lng": -8.6131},
            "menuPrice": 9.5,
            "foodType": "Traditional Portuguese",
            "whatsIncluded": ["soup", "main", "drink"],
            "practical": {"cardsAccepted": true, "groupFriendly": true},
            "googleRating": 4.3,
            "googleReviews": 127,
            "description": "Small family restaurant with daily specials",
            "dishes": ["Bacalhau à Brás", "Francesinha", "Caldo Verde"],
            "hours": lunch_hours()
        }),
        json!({
            "name": "Marisqueira do Porto",
            "address": "Rua dos Navegantes, 89, Matosinhos, Porto",
            "coordinates": {"lat": 41.1836, "lng": -8.6966},
            "menuPrice": 15.0,
            "foodType": "Seafood",
            "whatsIncluded": ["soup", "main", "drink", "coffee"],
            "practical": {"cardsAccepted": true, "groupFriendly": true, "parking": true},
            "googleRating": 4.4,
            "googleReviews": 203,
            "description": "Fresh seafood near the harbour",
            "dishes": ["Grilled Fish", "Seafood Rice", "Octopus Salad"],
            "hours": lunch_hours()
        }),
        json!({
            "name": "Café Ceuta",
            "address": "Rua de Ceuta, 20, Baixa, Porto",
            "coordinates": {"lat": 41.1480, "lng": -8.6130},
            "menuPrice": 7.5,
            "foodType": "Café",
            "whatsIncluded": ["soup", "main", "drink", "coffee"],
            "practical": {"quickService": true, "nearMetro": true},
            "googleRating": 4.0,
            "googleReviews": 64,
            "dishes": ["Prego no Pão", "Bifana"],
            "hours": lunch_hours()
        }),
        json!({
            "name": "Burger Palace",
            "address": "Avenida da Liberdade, 123, Santo António, Lisboa",
            "coordinates": {"lat": 38.7205, "lng": -9.1459},
            "menuPrice": 12.0,
            "foodType": "International",
            "whatsIncluded": ["main", "drink"],
            "practical": {"cardsAccepted": true, "quickService": true, "parking": true, "nearMetro": true},
            "googleRating": 4.1,
            "googleReviews": 89,
            "description": "Modern burger joint with craft options",
            "dishes": ["Classic Burger", "Veggie Burger", "Chicken Deluxe"],
            "hours": lunch_hours()
        }),
        json!({
            "name": "O Prado Verde",
            "address": "Rua da Madalena, 12, Baixa, Lisboa",
            "coordinates": {"lat": 38.7108, "lng": -9.1355},
            "menuPrice": 8.5,
            "foodType": "Vegetarian",
            "whatsIncluded": ["soup", "main", "dessert"],
            "practical": {"cardsAccepted": true, "groupFriendly": true, "nearMetro": true},
            "googleRating": 4.6,
            "googleReviews": 156,
            "description": "Seasonal vegetarian plates",
            "dishes": ["Quinoa Bowl", "Veggie Lasagna"],
            "hours": lunch_hours()
        }),
        json!({
            "name": "Cervejaria Alfama",
            "address": "Rua dos Remédios, 77, Alfama, Lisboa",
            "coordinates": {"lat": 38.7125, "lng": -9.1290},
            "menuPrice": 11.0,
            "foodType": "Traditional Portuguese",
            "whatsIncluded": ["bread", "main", "wine", "coffee"],
            "practical": {"groupFriendly": true},
            "googleRating": 3.9,
            "googleReviews": 41,
            "dishes": ["Sardinhas Assadas", "Arroz de Pato"],
            "hours": lunch_hours()
        }),
    ];

    raw.into_iter()
        .map(|value| serde_json::from_value(value).map_err(AppError::from))
        .collect()
}

#[cfg(feature = "ssr")]
pub use network::DemoNetwork;

#[cfg(feature = "ssr")]
mod network {
    use leptos::logging::warn;
    use rand::Rng;
    use std::time::Duration;

    use crate::config::DemoSettings;
    use crate::error::AppError;

    /// Injects latency and random failures in front of the API.
    #[derive(Debug, Clone, Default)]
    pub struct DemoNetwork {
        settings: DemoSettings,
    }

    impl DemoNetwork {
        pub fn new(settings: DemoSettings) -> Self {
            Self { settings }
        }

        pub fn is_active(&self) -> bool {
            self.settings.latency_ms.is_some() || self.settings.failure_rate > 0.0
        }

        /// Waits for the configured latency, then fails with the configured probability.
        pub async fn simulate(&self) -> Result<(), AppError> {
            let (delay_ms, fail) = {
                let mut rng = rand::thread_rng();
                let delay_ms = self
                    .settings
                    .latency_ms
                    .clone()
                    .map(|range| rng.gen_range(range))
                    .unwrap_or(0);
                let fail = rng.gen_bool(self.settings.failure_rate.clamp(0.0, 1.0));
                (delay_ms, fail)
            };

            if delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            if fail {
                warn!("[DEMO] Injected failure after {}ms", delay_ms);
                return Err(AppError::Network("simulated network failure".to_string()));
            }
            Ok(())
        }
    }

}
