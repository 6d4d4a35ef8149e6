//! The trip catalog served by `GET /api/trips`.

use rust_decimal::Decimal;
use serde::Serialize;
use trip_protocol::{TravelDna, TravelPace};

/// A listed trip.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripListing {
    pub id: String,
    pub title: String,
    pub host_name: String,
    /// What each traveller pays into escrow.
    #[serde(with = "rust_decimal::serde::float")]
    pub price_share: Decimal,
    #[serde(rename = "tripDNA")]
    pub dna: TravelDna,
    pub host_verified: bool,
    pub route: String,
    pub duration: String,
}

#[allow(clippy::too_many_arguments)]
fn listing(
    id: &str,
    title: &str,
    host_name: &str,
    price_share: i64,
    dna: (f64, f64, TravelPace),
    host_verified: bool,
    route: &str,
    duration: &str,
) -> TripListing {
    TripListing {
        id: id.to_string(),
        title: title.to_string(),
        host_name: host_name.to_string(),
        price_share: Decimal::from(price_share),
        dna: TravelDna {
            social_energy: dna.0,
            budget_range: dna.1,
            pace: dna.2,
        },
        host_verified,
        route: route.to_string(),
        duration: duration.to_string(),
    }
}

/// The launch catalog.
pub fn default_catalog() -> Vec<TripListing> {
    use TravelPace::{Active, Chill};

    vec![
        listing(
            "trip-1",
            "Bali Wellness Escape",
            "Maya",
            420,
            (5.0, 6.0, Chill),
            true,
            "Denpasar -> Ubud -> Uluwatu",
            "7 Days",
        ),
        listing(
            "trip-2",
            "Lisbon Food + Nightlife Week",
            "Andre",
            360,
            (8.0, 5.0, Active),
            true,
            "Alfama -> Bairro Alto -> Belem",
            "6 Days",
        ),
        listing(
            "trip-3",
            "Patagonia Trek Crew Trip",
            "Sofia",
            510,
            (6.0, 7.0, Active),
            false,
            "El Calafate -> El Chalten -> Torres del Paine",
            "10 Days",
        ),
        listing(
            "trip-4",
            "Tokyo Culture + Cafe Crawl",
            "Kenji",
            470,
            (6.0, 7.0, Chill),
            true,
            "Shibuya -> Asakusa -> Shimokitazawa",
            "7 Days",
        ),
        listing(
            "trip-5",
            "Iceland Northern Lights Drive",
            "Leah",
            640,
            (4.0, 8.0, Active),
            true,
            "Reykjavik -> Vik -> Jokulsarlon",
            "8 Days",
        ),
        listing(
            "trip-6",
            "Cartagena Beach + Music Weekend",
            "Nico",
            330,
            (9.0, 4.0, Active),
            false,
            "Getsemani -> Rosario Islands -> Old Town",
            "5 Days",
        ),
    ]
}
