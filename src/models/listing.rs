use serde::{Deserialize, Serialize};

/// One flattened listing as written to the JSONL output.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Listing {
    pub id: i64,
    pub title: String,
    pub active: bool,
    pub accepts_trade: bool,
    pub pet_friendly: bool,
    pub description: String,
    pub total_area: f64,
    pub useful_area: f64,
    pub category: String,
    pub price: f64,
    pub price_formatted: String,
    pub iptu: String,
    pub images: Vec<String>,
    pub transaction: String,
    pub bedrooms: i64,
    pub suites: i64,
    pub bathrooms: i64,
    pub garages: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub updated_at: String,
}

impl Listing {
    pub fn address(&self) -> String {
        [
            &self.street,
            &self.neighborhood,
            &self.city,
            &self.state,
            &self.zip_code,
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .map(String::as_str)
        .collect::<Vec<&str>>()
        .join(", ")
    }
}
