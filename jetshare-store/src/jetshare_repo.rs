use async_trait::async_trait;
use chrono::Utc;
use jetshare_core::jetshare::OfferStatus;
use jetshare_core::{
    BookingQuery, JetShareOffer, JetShareRepository, NewOffer, OfferQuery, RepositoryError,
    RepositoryResult, StatsRow, UserStats,
};
use reqwest::Method;
use serde_json::json;
use uuid::Uuid;

use crate::http;
use crate::supabase::{quoted, SupabaseClient, SERVICE};

const TABLE: &str = "jetshare_offers";
const STATS_PAGE: usize = 1000;

fn participant_filter(user_id: &str) -> String {
    let user = quoted(user_id);
    format!("(user_id.eq.{},matched_user_id.eq.{})", user, user)
}

fn cancellable_filter() -> String {
    let statuses: Vec<&str> = OfferStatus::CANCELLABLE.iter().map(|s| s.as_str()).collect();
    format!("in.({})", statuses.join(","))
}

#[async_trait]
impl JetShareRepository for SupabaseClient {
    async fn create_offer(&self, user_id: &str, offer: NewOffer) -> RepositoryResult<JetShareOffer> {
        let row = JetShareOffer::new(user_id, offer);
        let request = self.returning(Method::POST, TABLE).json(&row);

        let rows: Vec<JetShareOffer> = http::send_json(SERVICE, request).await?;
        rows.into_iter().next().ok_or_else(|| RepositoryError::Decode {
            service: SERVICE,
            message: "insert returned no rows".to_string(),
        })
    }

    async fn accept_offer(
        &self,
        user_id: &str,
        offer_id: Uuid,
    ) -> RepositoryResult<Option<JetShareOffer>> {
        let request = self
            .returning(Method::PATCH, TABLE)
            .query(&[
                ("id", format!("eq.{}", offer_id)),
                ("status", format!("eq.{}", OfferStatus::Open)),
                ("user_id", format!("neq.{}", user_id)),
            ])
            .json(&json!({
                "status": OfferStatus::Accepted,
                "matched_user_id": user_id,
                "updated_at": Utc::now(),
            }));

        let rows: Vec<JetShareOffer> = http::send_json(SERVICE, request).await?;
        Ok(rows.into_iter().next())
    }

    async fn cancel_offer(&self, user_id: &str, offer_id: Uuid) -> RepositoryResult<bool> {
        let request = self
            .returning(Method::PATCH, TABLE)
            .query(&[
                ("id", format!("eq.{}", offer_id)),
                ("user_id", format!("eq.{}", user_id)),
                ("status", cancellable_filter()),
            ])
            .json(&json!({
                "status": OfferStatus::Cancelled,
                "updated_at": Utc::now(),
            }));

        let rows: Vec<JetShareOffer> = http::send_json(SERVICE, request).await?;
        Ok(!rows.is_empty())
    }

    async fn list_offers(
        &self,
        user_id: &str,
        query: &OfferQuery,
    ) -> RepositoryResult<Vec<JetShareOffer>> {
        let mut params = vec![
            ("select", "*".to_string()),
            ("status", format!("eq.{}", OfferStatus::Open)),
            ("user_id", format!("neq.{}", user_id)),
        ];
        if let Some(departure) = &query.departure_location {
            params.push(("departure_location", format!("eq.{}", departure)));
        }
        if let Some(arrival) = &query.arrival_location {
            params.push(("arrival_location", format!("eq.{}", arrival)));
        }
        params.push(("order", "flight_date.asc".to_string()));
        params.push(("limit", query.limit.to_string()));
        params.push(("offset", query.offset.to_string()));

        http::send_json(SERVICE, self.table(Method::GET, TABLE).query(&params)).await
    }

    async fn list_bookings(
        &self,
        user_id: &str,
        query: &BookingQuery,
    ) -> RepositoryResult<Vec<JetShareOffer>> {
        let mut params = vec![
            ("select", "*".to_string()),
            ("or", participant_filter(user_id)),
        ];
        if let Some(status) = query.status {
            params.push(("status", format!("eq.{}", status)));
        }
        params.push(("order", "created_at.desc".to_string()));
        params.push(("limit", query.limit.to_string()));
        params.push(("offset", query.offset.to_string()));

        http::send_json(SERVICE, self.table(Method::GET, TABLE).query(&params)).await
    }

    /// Pages through every participant row; the server may cap each page
    /// below `STATS_PAGE`, so only an empty page ends the scan.
    async fn user_stats(&self, user_id: &str) -> RepositoryResult<UserStats> {
        let mut stats = UserStats::default();
        let mut offset = 0usize;

        loop {
            let request = self.table(Method::GET, TABLE).query(&[
                ("select", StatsRow::COLUMNS.to_string()),
                ("or", participant_filter(user_id)),
                ("order", "id.asc".to_string()),
                ("limit", STATS_PAGE.to_string()),
                ("offset", offset.to_string()),
            ]);

            let rows: Vec<StatsRow> = http::send_json(SERVICE, request).await?;
            if rows.is_empty() {
                break;
            }
            for row in &rows {
                stats.record(user_id, row);
            }
            offset += rows.len();
        }

        Ok(stats)
    }
}
