use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A private jet model offered on the platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Jet {
    pub id: Uuid,
    pub model: String,
    pub manufacturer: String,
    pub capacity: i32,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Airport {
    pub code: String,
    pub name: String,
    pub city: String,
    pub country: String,
}

/// Orders jets the way the admin listing presents them: manufacturer, then model.
pub fn sort_jets(jets: &mut [Jet]) {
    jets.sort_by(|a, b| {
        a.manufacturer
            .cmp(&b.manufacturer)
            .then_with(|| a.model.cmp(&b.model))
    });
}

pub fn sort_airports(airports: &mut [Airport]) {
    airports.sort_by(|a, b| a.city.cmp(&b.city));
}
