use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Lifecycle of a flight-share offer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Open,
    Accepted,
    Completed,
    Cancelled,
}

impl OfferStatus {
    pub const ALL: [OfferStatus; 4] = [
        OfferStatus::Open,
        OfferStatus::Accepted,
        OfferStatus::Completed,
        OfferStatus::Cancelled,
    ];

    /// Statuses the owner may still withdraw from.
    pub const CANCELLABLE: [OfferStatus; 2] = [OfferStatus::Open, OfferStatus::Accepted];

    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Open => "open",
            OfferStatus::Accepted => "accepted",
            OfferStatus::Completed => "completed",
            OfferStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_cancellable(&self) -> bool {
        Self::CANCELLABLE.contains(self)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, OfferStatus::Open | OfferStatus::Accepted)
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown offer status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OfferStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A flight-share offer. The creator owns the flight and asks another user
/// to cover `requested_share_amount`; once accepted, the same record is that
/// user's booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JetShareOffer {
    pub id: Uuid,
    pub user_id: String,
    pub flight_date: DateTime<Utc>,
    pub departure_location: String,
    pub arrival_location: String,
    #[serde(default)]
    pub aircraft_model: Option<String>,
    pub total_seats: i32,
    pub available_seats: i32,
    pub total_flight_cost: f64,
    pub requested_share_amount: f64,
    pub status: OfferStatus,
    #[serde(default)]
    pub matched_user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JetShareOffer {
    pub fn new(user_id: &str, new: NewOffer) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            flight_date: new.flight_date,
            departure_location: new.departure_location,
            arrival_location: new.arrival_location,
            aircraft_model: new.aircraft_model,
            total_seats: new.total_seats,
            available_seats: new.available_seats,
            total_flight_cost: new.total_flight_cost,
            requested_share_amount: new.requested_share_amount,
            status: OfferStatus::Open,
            matched_user_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// True when the user created the offer or accepted it.
    pub fn involves(&self, user_id: &str) -> bool {
        self.is_owned_by(user_id) || self.matched_user_id.as_deref() == Some(user_id)
    }

    pub fn can_be_cancelled_by(&self, user_id: &str) -> bool {
        self.is_owned_by(user_id) && self.status.is_cancellable()
    }

    pub fn can_be_accepted_by(&self, user_id: &str) -> bool {
        self.status == OfferStatus::Open && !self.is_owned_by(user_id)
    }

    pub fn cancel(&mut self) {
        self.status = OfferStatus::Cancelled;
        self.updated_at = Utc::now();
    }

    pub fn accept(&mut self, user_id: &str) {
        self.status = OfferStatus::Accepted;
        self.matched_user_id = Some(user_id.to_string());
        self.updated_at = Utc::now();
    }
}

/// Fields a user supplies when publishing an offer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewOffer {
    pub flight_date: DateTime<Utc>,
    pub departure_location: String,
    pub arrival_location: String,
    pub aircraft_model: Option<String>,
    pub total_seats: i32,
    pub available_seats: i32,
    pub total_flight_cost: f64,
    pub requested_share_amount: f64,
}

/// Filter and page over the caller's bookings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingQuery {
    pub status: Option<OfferStatus>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for BookingQuery {
    fn default() -> Self {
        Self {
            status: None,
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

impl BookingQuery {
    pub fn matches(&self, user_id: &str, offer: &JetShareOffer) -> bool {
        offer.involves(user_id) && self.status.map_or(true, |s| offer.status == s)
    }
}

/// Filter and page over open offers published by other users.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfferQuery {
    pub departure_location: Option<String>,
    pub arrival_location: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl OfferQuery {
    pub fn matches(&self, user_id: &str, offer: &JetShareOffer) -> bool {
        offer.status == OfferStatus::Open
            && !offer.is_owned_by(user_id)
            && self
                .departure_location
                .as_deref()
                .map_or(true, |d| offer.departure_location == d)
            && self
                .arrival_location
                .as_deref()
                .map_or(true, |a| offer.arrival_location == a)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserStats {
    pub total_offers: u32,
    pub active_offers: u32,
    pub total_bookings: u32,
    pub completed_flights: u32,
    /// Share amounts other users covered on the caller's completed flights.
    pub total_saved: f64,
    /// Share amounts the caller paid on flights they joined.
    pub total_spent: f64,
}

/// The columns of an offer that feed [`UserStats`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatsRow {
    pub user_id: String,
    #[serde(default)]
    pub matched_user_id: Option<String>,
    pub status: OfferStatus,
    pub requested_share_amount: f64,
}

impl StatsRow {
    pub const COLUMNS: &'static str = "user_id,matched_user_id,status,requested_share_amount";
}

impl From<&JetShareOffer> for StatsRow {
    fn from(offer: &JetShareOffer) -> Self {
        Self {
            user_id: offer.user_id.clone(),
            matched_user_id: offer.matched_user_id.clone(),
            status: offer.status,
            requested_share_amount: offer.requested_share_amount,
        }
    }
}

impl UserStats {
    pub fn from_offers<'a, I>(user_id: &str, offers: I) -> Self
    where
        I: IntoIterator<Item = &'a JetShareOffer>,
    {
        let mut stats = UserStats::default();
        for offer in offers {
            stats.record(user_id, &StatsRow::from(offer));
        }
        stats
    }

    /// Folds one offer into the totals; rows the user takes no part in are ignored.
    pub fn record(&mut self, user_id: &str, row: &StatsRow) {
        let owned = row.user_id == user_id;
        let joined = row.matched_user_id.as_deref() == Some(user_id);
        let completed = row.status == OfferStatus::Completed;

        if owned {
            self.total_offers += 1;
            if row.status.is_active() {
                self.active_offers += 1;
            }
            if completed {
                self.total_saved += row.requested_share_amount;
            }
        }
        if joined {
            self.total_bookings += 1;
            if completed {
                self.total_spent += row.requested_share_amount;
            }
        }
        if completed && (owned || joined) {
            self.completed_flights += 1;
        }
    }
}
