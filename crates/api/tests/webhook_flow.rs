use api::{AppState, create_router};
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode, header},
};
use dockline_core::models::ProfileRole;
use dockline_telegram::TelegramGateway;
use moka::future::Cache;
use serde_json::{Value, json};
use sqlx::PgPool;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

fn test_app(pool: PgPool) -> axum::Router {
    let state = AppState {
        pool,
        gateway: TelegramGateway::new("123456:TEST-TOKEN"),
        profile_cache: Cache::builder()
            .time_to_live(Duration::from_secs(300))
            .build(),
        access_token_secret: "webhook-test-secret".to_string(),
        charter_timezone: chrono_tz::UTC,
    };
    create_router(state, "*")
}

fn webhook_request(body: impl Into<Body>) -> Request<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri("/telegram/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap();

    req.extensions_mut().insert(ConnectInfo(SocketAddr::new(
        IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
        8080,
    )));
    req
}

/// An update shaped the way Telegram actually sends callback queries,
/// including fields the handler does not read.
fn callback_update(sender_telegram_id: i64, data: &str) -> Value {
    json!({
        "update_id": 874_190_003_i64,
        "callback_query": {
            "id": "4382756298112",
            "from": {
                "id": sender_telegram_id,
                "is_bot": false,
                "first_name": "Morgan",
                "username": "morgan_at_the_dock"
            },
            "message": {
                "message_id": 42,
                "chat": { "id": sender_telegram_id, "type": "private" },
                "date": 1_756_000_000,
                "text": "New booking request"
            },
            "chat_instance": "-511934812",
            "data": data
        }
    })
}

async fn setup_boat(pool: &PgPool, name: &str) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO boats (name, capacity, price_per_hour) VALUES ($1, 12, 20000) RETURNING id",
    )
    .bind(name)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn setup_manager(pool: &PgPool, boat_id: Uuid) -> (Uuid, i64) {
    let telegram_id = rand::random::<i64>().abs();
    let profile_id: Uuid = sqlx::query_scalar(
        "INSERT INTO profiles (telegram_id, display_name, role) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(telegram_id)
    .bind("Dock Manager")
    .bind(ProfileRole::Manager)
    .fetch_one(pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO boat_managers (boat_id, user_id) VALUES ($1, $2)")
        .bind(boat_id)
        .bind(profile_id)
        .execute(pool)
        .await
        .unwrap();
    (profile_id, telegram_id)
}

async fn create_pending_booking(pool: &PgPool, boat_id: Uuid) -> Uuid {
    sqlx::query_scalar(
        r#"
        INSERT INTO bookings (boat_id, start_time, end_time, price, guest_name, guest_phone)
        VALUES ($1, NOW() + INTERVAL '2 days', NOW() + INTERVAL '2 days 4 hours', 80000, 'Walk-in', '+65 8000 3333')
        RETURNING id
        "#,
    )
    .bind(boat_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn booking_status(pool: &PgPool, booking_id: Uuid) -> String {
    sqlx::query_scalar("SELECT status::text FROM bookings WHERE id = $1")
        .bind(booking_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn outbox_count(pool: &PgPool, message_type: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM outbox_messages WHERE message_type = $1")
        .bind(message_type)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_webhook_swallows_malformed_payloads(pool: PgPool) {
    let app = test_app(pool);

    // Telegram retries on any non-200, so even garbage is acknowledged
    let response = app
        .clone()
        .oneshot(webhook_request("definitely not json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(webhook_request(
            json!({"update_id": 1, "poll": {"id": "x"}}).to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_webhook_ignores_plain_messages(pool: PgPool) {
    let app = test_app(pool.clone());

    let update = json!({
        "update_id": 2,
        "message": {
            "message_id": 17,
            "chat": { "id": 5005, "type": "private" },
            "from": { "id": 5005, "is_bot": false, "first_name": "Sam" },
            "text": "hello bot"
        }
    });
    let response = app.oneshot(webhook_request(update.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM outbox_messages")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(total, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_webhook_rejects_unknown_sender(pool: PgPool) {
    let app = test_app(pool.clone());
    let boat_id = setup_boat(&pool, "Gatekeeper").await;
    setup_manager(&pool, boat_id).await;
    let booking_id = create_pending_booking(&pool, boat_id).await;

    let update = callback_update(999_999_001, &format!("regular:confirm:{booking_id}"));
    let response = app.oneshot(webhook_request(update.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(booking_status(&pool, booking_id).await, "pending");
    assert_eq!(outbox_count(&pool, "booking_status").await, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_webhook_swallows_malformed_callback_data(pool: PgPool) {
    let app = test_app(pool.clone());
    let boat_id = setup_boat(&pool, "Oddball").await;
    let (_, manager_telegram_id) = setup_manager(&pool, boat_id).await;
    let booking_id = create_pending_booking(&pool, boat_id).await;

    for data in [
        "nonsense",
        "regular:confirm:not-a-uuid",
        "regular:launch:00000000-0000-0000-0000-000000000000",
    ] {
        let update = callback_update(manager_telegram_id, data);
        let response = app
            .clone()
            .oneshot(webhook_request(update.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(booking_status(&pool, booking_id).await, "pending");
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_webhook_manager_button_confirms_booking(pool: PgPool) {
    let app = test_app(pool.clone());
    let boat_id = setup_boat(&pool, "Button Masher").await;
    let (_, manager_telegram_id) = setup_manager(&pool, boat_id).await;
    let booking_id = create_pending_booking(&pool, boat_id).await;

    let update = callback_update(manager_telegram_id, &format!("regular:confirm:{booking_id}"));
    let response = app
        .clone()
        .oneshot(webhook_request(update.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(booking_status(&pool, booking_id).await, "confirmed");
    assert_eq!(outbox_count(&pool, "booking_status").await, 1);

    // A second press of the stale button is a no-op, not a new event
    let update = callback_update(manager_telegram_id, &format!("regular:confirm:{booking_id}"));
    let response = app
        .clone()
        .oneshot(webhook_request(update.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(outbox_count(&pool, "booking_status").await, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_webhook_trip_booking_cancel_credits_seats(pool: PgPool) {
    let app = test_app(pool.clone());
    let boat_id = setup_boat(&pool, "Group Ticket").await;
    let (_, manager_telegram_id) = setup_manager(&pool, boat_id).await;

    let trip_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO group_trips (boat_id, start_time, end_time, available_seats, price_per_seat)
        VALUES ($1, NOW() + INTERVAL '5 days', NOW() + INTERVAL '5 days 3 hours', 6, 5000)
        RETURNING id
        "#,
    )
    .bind(boat_id)
    .fetch_one(&pool)
    .await
    .unwrap();

    // Seed a confirmed party of four with the seats already debited
    let trip_booking_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO group_trip_bookings
            (group_trip_id, adult_count, child_count, guest_name, guest_phone, status)
        VALUES ($1, 3, 1, 'Party Lead', '+65 8000 4444', 'confirmed')
        RETURNING id
        "#,
    )
    .bind(trip_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    sqlx::query("UPDATE group_trips SET available_seats = available_seats - 4 WHERE id = $1")
        .bind(trip_id)
        .execute(&pool)
        .await
        .unwrap();

    let update = callback_update(
        manager_telegram_id,
        &format!("group_trip:cancel:{trip_booking_id}"),
    );
    let response = app.oneshot(webhook_request(update.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let status: String =
        sqlx::query_scalar("SELECT status::text FROM group_trip_bookings WHERE id = $1")
            .bind(trip_booking_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, "cancelled");

    let seats: i32 = sqlx::query_scalar("SELECT available_seats FROM group_trips WHERE id = $1")
        .bind(trip_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(seats, 6);
    assert_eq!(outbox_count(&pool, "trip_booking_status").await, 1);
}
