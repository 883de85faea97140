use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use jetshare_api::{app, AppState, AuthConfig};
use jetshare_core::{Airport, Jet, JetShareOffer, NewOffer, OfferStatus, SimulationRun};
use jetshare_store::app_config::PineconeConfig;
use jetshare_store::memory::Seed;
use jetshare_store::{Backends, MemoryFactory, MemoryStore, PineconeIndex, UnconfiguredIndex};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "integration-test-secret";
const OWNER: &str = "owner-7f3a";
const BUYER: &str = "buyer-2c91";

// ============================================================================
// Fixtures
// ============================================================================

fn auth() -> AuthConfig {
    AuthConfig {
        secret: SECRET.to_string(),
        audience: "authenticated".to_string(),
        session_cookie: "sb-access-token".to_string(),
    }
}

fn token_for(user_id: &str) -> String {
    let claims = json!({
        "sub": user_id,
        "email": format!("{}@example.com", user_id),
        "role": "authenticated",
        "aud": "authenticated",
        "exp": (Utc::now() + Duration::hours(1)).timestamp(),
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn jet(manufacturer: &str, model: &str) -> Jet {
    Jet {
        id: Uuid::new_v4(),
        model: model.to_string(),
        manufacturer: manufacturer.to_string(),
        capacity: 8,
        image_url: None,
    }
}

fn airport(code: &str, city: &str) -> Airport {
    Airport {
        code: code.to_string(),
        name: format!("{} Executive", city),
        city: city.to_string(),
        country: "US".to_string(),
    }
}

fn offer(owner: &str, from: &str, to: &str, days_out: i64) -> JetShareOffer {
    JetShareOffer::new(
        owner,
        NewOffer {
            flight_date: Utc::now() + Duration::days(days_out),
            departure_location: from.to_string(),
            arrival_location: to.to_string(),
            aircraft_model: Some("Challenger 350".to_string()),
            total_seats: 8,
            available_seats: 6,
            total_flight_cost: 30_000.0,
            requested_share_amount: 12_000.0,
        },
    )
}

fn seeded_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::from_seed(Seed {
        jets: vec![
            jet("Gulfstream", "G650"),
            jet("Bombardier", "Global 7500"),
            jet("Bombardier", "Challenger 350"),
        ],
        airports: vec![
            airport("KVNY", "Van Nuys"),
            airport("KTEB", "Teterboro"),
            airport("KPBI", "West Palm Beach"),
            airport("KASE", "Aspen"),
        ],
        offers: Vec::new(),
        simulations: vec![SimulationRun {
            id: Uuid::new_v4(),
            user_id: None,
            scenario: "shared-leg".to_string(),
            parameters: json!({"seats": 4}),
            results: json!({"savings": 0.42}),
            created_at: Utc::now(),
        }],
    }))
}

fn router(store: Arc<MemoryStore>) -> Router {
    app(AppState::new(Backends::in_memory(store), auth()))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn get_as(uri: &str, user_id: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(user_id)))
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_as(uri: &str, user_id: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, format!("sb-access-token={}", token_for(user_id)))
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ============================================================================
// Reference data
// ============================================================================

#[tokio::test]
async fn test_airports_sorted_by_city() {
    let app = router(seeded_store());
    let (status, body) = send(&app, get("/api/airports")).await;

    assert_eq!(status, StatusCode::OK);
    let cities: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["city"].as_str().unwrap())
        .collect();
    assert_eq!(cities, ["Aspen", "Teterboro", "Van Nuys", "West Palm Beach"]);
    assert_eq!(body[0]["code"], "KASE");
}

#[tokio::test]
async fn test_admin_jets_sorted_by_manufacturer_then_model() {
    let app = router(seeded_store());
    let (status, body) = send(&app, get("/api/admin/jets")).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<String> = body["jets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|j| format!("{} {}", j["manufacturer"].as_str().unwrap(), j["model"].as_str().unwrap()))
        .collect();
    assert_eq!(
        names,
        ["Bombardier Challenger 350", "Bombardier Global 7500", "Gulfstream G650"]
    );
}

#[tokio::test]
async fn test_simulation_history() {
    let app = router(seeded_store());
    let (status, body) = send(&app, get("/api/simulation/history?limit=10")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["history"][0]["scenario"], "shared-leg");

    let (status, body) = send(&app, get("/api/simulation/history?limit=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("limit:"));
}

// ============================================================================
// Auth stubs and CORS
// ============================================================================

#[tokio::test]
async fn test_auth_stubs() {
    let app = router(seeded_store());

    let (status, body) = send(&app, get("/api/auth/session")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"user": null, "expires": null}));

    let request = Request::post("/api/auth/_log")
        .body(Body::from("not even json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));
}

#[tokio::test]
async fn test_cors_only_on_simulation_history() {
    let app = router(seeded_store());

    let preflight = Request::options("/api/simulation/history")
        .header(header::ORIGIN, "https://simulator.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(preflight).await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );

    let cross_origin = Request::get("/api/airports")
        .header(header::ORIGIN, "https://simulator.example.com")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(cross_origin).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

// ============================================================================
// Embeddings
// ============================================================================

#[tokio::test]
async fn test_upsert_rejects_missing_fields() {
    let app = router(seeded_store());

    let (status, body) = send(&app, post_json("/api/embedding/upsert", json!({"values": [0.1]}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");
    assert!(body["details"].as_str().unwrap().contains("id"));

    let (status, body) = send(
        &app,
        post_json("/api/embedding/upsert", json!({"id": "", "values": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("id:"));
    assert!(error.contains("values:"));
    assert!(body["details"]["values"].is_array());
}

#[tokio::test]
async fn test_embedding_upsert_query_delete() {
    let app = router(seeded_store());

    for (id, values, tier) in [
        ("g650", json!([1.0, 0.0, 0.0]), "heavy"),
        ("cl350", json!([0.9, 0.1, 0.0]), "super-midsize"),
        ("phenom", json!([0.0, 1.0, 0.0]), "light"),
    ] {
        let (status, body) = send(
            &app,
            post_json(
                "/api/embedding/upsert",
                json!({"id": id, "values": values, "metadata": {"tier": tier}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));
    }

    let (status, body) = send(
        &app,
        post_json("/api/embedding/query", json!({"vector": [1.0, 0.0, 0.0], "topK": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["matches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["g650", "cl350"]);
    assert_eq!(body["matches"][0]["metadata"]["tier"], "heavy");

    let (_, body) = send(
        &app,
        post_json(
            "/api/embedding/query",
            json!({"vector": [1.0, 0.0, 0.0], "filter": {"tier": {"$ne": "heavy"}}}),
        ),
    )
    .await;
    assert_eq!(body["matches"][0]["id"], "cl350");

    let (status, _) = send(&app, post_json("/api/embedding/delete", json!({"id": "g650"}))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(
        &app,
        post_json("/api/embedding/query", json!({"vector": [1.0, 0.0, 0.0], "topK": 1})),
    )
    .await;
    assert_eq!(body["matches"][0]["id"], "cl350");
}

#[tokio::test]
async fn test_query_relays_index_response() {
    let server = MockServer::start().await;
    let index_response = json!({
        "matches": [
            {"id": "g650", "score": 0.93, "values": [], "metadata": {"tier": "heavy"}},
            {"id": "cl350", "score": 0.81, "values": []}
        ],
        "namespace": "",
        "usage": {"readUnits": 6}
    });
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_json(json!({
            "vector": [0.3, 0.7],
            "topK": 10,
            "includeMetadata": true,
            "includeValues": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(index_response.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let vectors = PineconeIndex::new(&PineconeConfig {
        api_key: "pc-test-key".to_string(),
        index_host: server.uri(),
        request_timeout_secs: 5,
    })
    .unwrap();
    let backends = Backends {
        clients: Arc::new(MemoryFactory::new(seeded_store())),
        vectors: Arc::new(vectors),
    };
    let app = app(AppState::new(backends, auth()));

    let (status, body) = send(&app, post_json("/api/embedding/query", json!({"vector": [0.3, 0.7]}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, index_response);
}

#[tokio::test]
async fn test_query_relays_response_without_namespace() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"matches": []})))
        .mount(&server)
        .await;

    let vectors = PineconeIndex::new(&PineconeConfig {
        api_key: "pc-test-key".to_string(),
        index_host: server.uri(),
        request_timeout_secs: 5,
    })
    .unwrap();
    let backends = Backends {
        clients: Arc::new(MemoryFactory::new(seeded_store())),
        vectors: Arc::new(vectors),
    };
    let app = app(AppState::new(backends, auth()));

    let (status, body) = send(&app, post_json("/api/embedding/query", json!({"vector": [0.3, 0.7]}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"matches": []}));
}

#[tokio::test]
async fn test_unconfigured_index_answers_500() {
    let backends = Backends {
        clients: Arc::new(MemoryFactory::new(seeded_store())),
        vectors: Arc::new(UnconfiguredIndex::new("api_key and index_host are required")),
    };
    let app = app(AppState::new(backends, auth()));

    let (status, body) = send(
        &app,
        post_json("/api/embedding/upsert", json!({"id": "g650", "values": [0.1, 0.2]})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to upsert embedding");
    assert!(body["details"].as_str().unwrap().contains("pinecone is not configured"));

    // the rest of the API keeps serving
    let (status, _) = send(&app, get("/api/airports")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_index_failure_surfaces_details() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vectors/delete"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"error": {"message": "index unavailable"}})))
        .mount(&server)
        .await;

    let vectors = PineconeIndex::new(&PineconeConfig {
        api_key: "pc-test-key".to_string(),
        index_host: server.uri(),
        request_timeout_secs: 5,
    })
    .unwrap();
    let backends = Backends {
        clients: Arc::new(MemoryFactory::new(seeded_store())),
        vectors: Arc::new(vectors),
    };
    let app = app(AppState::new(backends, auth()));

    let (status, body) = send(&app, post_json("/api/embedding/delete", json!({"id": "g650"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to delete embedding");
    assert!(body["details"].as_str().unwrap().contains("index unavailable"));
}

// ============================================================================
// JetShare
// ============================================================================

#[tokio::test]
async fn test_jetshare_requires_session() {
    let app = router(seeded_store());

    let (status, body) = send(
        &app,
        post_json("/api/jetshare/cancelOffer", json!({"offer_id": Uuid::new_v4()})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Unauthorized"}));

    let forged = Request::get("/api/jetshare/stats")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_offer_actions_reject_non_uuid() {
    let app = router(seeded_store());

    for route in ["/api/jetshare/cancelOffer", "/api/jetshare/acceptOffer"] {
        let (status, body) = send(&app, post_as(route, OWNER, json!({"offer_id": "offer-42"}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", route);
        assert_eq!(body["error"], "Invalid request body");
        let details = body["details"].as_str().unwrap();
        assert!(details.contains("offer_id"), "{}", details);
        assert!(details.contains("must be a valid UUID"), "{}", details);
    }
}

#[tokio::test]
async fn test_get_offers_paging_rules() {
    let app = router(seeded_store());

    let (status, body) = send(&app, get_as("/api/jetshare/getOffers?limit=0", BUYER)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("limit:"));
    assert!(body["details"]["limit"].is_array());

    let (status, _) = send(&app, get_as("/api/jetshare/getOffers?limit=101", BUYER)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, get_as("/api/jetshare/getOffers?offset=-1", BUYER)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid query string");

    let (status, body) = send(&app, get_as("/api/jetshare/getOffers?limit=100&offset=0", BUYER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_cancel_only_by_owner_and_once() {
    let store = seeded_store();
    let listed = offer(OWNER, "KTEB", "KPBI", 10);
    let id = listed.id;
    store.insert_offer(listed).await;
    let app = router(store.clone());

    let (status, body) = send(&app, post_as("/api/jetshare/cancelOffer", BUYER, json!({"offer_id": id}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);

    let (_, body) = send(&app, post_as("/api/jetshare/cancelOffer", OWNER, json!({"offer_id": id}))).await;
    assert_eq!(body["success"], true);
    assert_eq!(store.offer(id).await.unwrap().status, OfferStatus::Cancelled);

    let (_, body) = send(&app, post_as("/api/jetshare/cancelOffer", OWNER, json!({"offer_id": id}))).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_create_accept_and_list() {
    let store = seeded_store();
    let app = router(store.clone());

    let create = json!({
        "flight_date": (Utc::now() + Duration::days(14)).to_rfc3339(),
        "departure_location": "KTEB",
        "arrival_location": "KASE",
        "aircraft_model": "Global 7500",
        "total_seats": 12,
        "total_flight_cost": 80000.0,
        "requested_share_amount": 40000.0
    });
    let (status, body) = send(&app, post_as("/api/jetshare/createOffer", OWNER, create)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["offer"]["status"], "open");
    assert_eq!(body["offer"]["available_seats"], 12);
    let id = body["offer"]["id"].as_str().unwrap().to_string();

    // the owner does not see their own listing in the marketplace
    let (_, body) = send(&app, get_as("/api/jetshare/getOffers", OWNER)).await;
    assert_eq!(body["offers"].as_array().unwrap().len(), 0);

    let (_, body) = send(&app, get_as("/api/jetshare/getOffers?arrival_location=KASE", BUYER)).await;
    assert_eq!(body["offers"][0]["id"], id.as_str());

    let (_, body) = send(&app, post_as("/api/jetshare/acceptOffer", OWNER, json!({"offer_id": id}))).await;
    assert_eq!(body["success"], false);

    let (_, body) = send(&app, post_as("/api/jetshare/acceptOffer", BUYER, json!({"offer_id": id}))).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["offer"]["status"], "accepted");
    assert_eq!(body["offer"]["matched_user_id"], BUYER);

    let (_, body) = send(&app, post_as("/api/jetshare/acceptOffer", "late-comer", json!({"offer_id": id}))).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_create_offer_rules() {
    let app = router(seeded_store());
    let create = json!({
        "flight_date": (Utc::now() - Duration::days(1)).to_rfc3339(),
        "departure_location": "KTEB",
        "arrival_location": "KPBI",
        "total_seats": 6,
        "total_flight_cost": 20000.0,
        "requested_share_amount": 5000.0
    });
    let (status, body) = send(&app, post_as("/api/jetshare/createOffer", OWNER, create)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "flight date must be in the future");
}

#[tokio::test]
async fn test_bookings_and_stats() {
    let store = seeded_store();
    let mut accepted = offer("someone-else", "KVNY", "KASE", 3);
    accepted.accept(OWNER);
    let mut completed = offer(OWNER, "KTEB", "KPBI", 1);
    completed.accept(BUYER);
    completed.status = OfferStatus::Completed;
    let mut open = offer(OWNER, "KPBI", "KTEB", 20);
    let unrelated = offer(BUYER, "KASE", "KVNY", 5);
    let now = Utc::now();
    accepted.created_at = now - Duration::hours(3);
    completed.created_at = now - Duration::hours(2);
    open.created_at = now - Duration::hours(1);
    for o in [accepted.clone(), completed.clone(), open.clone(), unrelated.clone()] {
        store.insert_offer(o).await;
    }
    let app = router(store);

    let (status, body) = send(&app, get_as("/api/jetshare/getBookings", OWNER)).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["bookings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 3);
    assert!(!ids.contains(&unrelated.id.to_string().as_str()));
    // newest first
    assert_eq!(
        ids,
        [open.id.to_string(), completed.id.to_string(), accepted.id.to_string()]
    );

    let (_, body) = send(&app, get_as("/api/jetshare/getBookings?status=completed", OWNER)).await;
    assert_eq!(body["bookings"].as_array().unwrap().len(), 1);
    assert_eq!(body["bookings"][0]["id"], completed.id.to_string());

    let (_, body) = send(&app, get_as("/api/jetshare/getBookings?limit=1&offset=1", OWNER)).await;
    assert_eq!(body["bookings"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, get_as("/api/jetshare/getBookings?status=pending", OWNER)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("status:"));

    let (status, body) = send(&app, get_as("/api/jetshare/stats", OWNER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["stats"]["total_offers"], 2);
    assert_eq!(body["stats"]["total_bookings"], 1);
}
