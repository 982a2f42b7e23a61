//! End-to-end tests which drive the whole router over HTTP against an
//! in-memory database.

use axum_test::{TestServer, TestServerConfig};
use diesel::{
    prelude::*,
    r2d2::{ConnectionManager, Pool},
};
use uuid::Uuid;

use crate::{
    config::create_app,
    schema::{coach_travels, rooms, tournaments},
    state::DbPool,
    travel::rooms::Room,
};

fn pool() -> DbPool {
    Pool::builder()
        .max_size(1)
        .build(ConnectionManager::new(":memory:"))
        .unwrap()
}

fn server(pool: DbPool) -> TestServer {
    TestServer::new_with_config(
        create_app(pool),
        TestServerConfig {
            save_cookies: true,
            ..Default::default()
        },
    )
    .unwrap()
}

async fn register_and_login(server: &TestServer) {
    let response = server
        .post("/register")
        .form(&[
            ("username", "touchlineadmin"),
            ("email", "admin@example.com"),
            ("password", "hunter2hunter2"),
            ("password2", "hunter2hunter2"),
        ])
        .await;
    assert!(
        response.status_code().is_success()
            || response.status_code().is_redirection(),
        "registration failed: {}",
        response.text()
    );
}

#[tokio::test]
async fn anonymous_home_offers_login() {
    let server = server(pool());

    let response = server.get("/").await;

    assert!(response.status_code().is_success());
    assert!(response.text().contains("Log in"));
}

#[tokio::test]
async fn register_then_see_dashboard() {
    let server = server(pool());
    register_and_login(&server).await;

    let response = server.get("/").await;

    assert!(response.status_code().is_success());
    assert!(response.text().contains("Dashboard"));
}

#[tokio::test]
async fn created_tournament_shows_up_in_the_list() {
    let server = server(pool());
    register_and_login(&server).await;

    let response = server
        .post("/tournaments/create")
        .form(&[
            ("name", "Desert Showdown"),
            ("gender_focus", "Girls"),
            ("status", "Not Started"),
            ("age_division_focus", "12U"),
            ("start_date", "2026-11-07"),
        ])
        .await;
    assert!(
        response.status_code().is_redirection(),
        "create failed: {}",
        response.text()
    );

    let list = server.get("/tournaments").await;
    assert!(list.text().contains("Desert Showdown"));

    let dashboard = server.get("/").await;
    assert!(dashboard.text().contains("Desert Showdown"));
}

#[tokio::test]
async fn assigning_a_roomed_coach_moves_them() {
    let pool = pool();
    let server = server(pool.clone());
    register_and_login(&server).await;

    let (coach_id, room_a, room_b) = {
        let mut conn = pool.get().unwrap();

        let tournament_id = Uuid::now_v7().to_string();
        diesel::insert_into(tournaments::table)
            .values((
                tournaments::id.eq(&tournament_id),
                tournaments::name.eq("Roomed Open"),
                tournaments::gender_focus.eq("Girls"),
                tournaments::status.eq("Not Started"),
                tournaments::created_at
                    .eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .unwrap();

        let coach_id = Uuid::now_v7().to_string();
        diesel::insert_into(coach_travels::table)
            .values((
                coach_travels::id.eq(&coach_id),
                coach_travels::tournament_id.eq(&tournament_id),
                coach_travels::coach_name.eq("Sam Ortiz"),
                coach_travels::attendance_confirmed.eq(true),
            ))
            .execute(&mut conn)
            .unwrap();

        let mut make_room = |number: &str| {
            let id = Uuid::now_v7().to_string();
            diesel::insert_into(rooms::table)
                .values((
                    rooms::id.eq(&id),
                    rooms::tournament_id.eq(&tournament_id),
                    rooms::room_number.eq(number),
                    rooms::hotel.eq("Hilton"),
                    rooms::room_type.eq("Double"),
                    rooms::occupants.eq("[]"),
                ))
                .execute(&mut conn)
                .unwrap();
            id
        };
        let room_a = make_room("Room 1");
        let room_b = make_room("Room 2");

        (coach_id, room_a, room_b)
    };

    for room in [&room_a, &room_b] {
        let response = server
            .post("/travel/rooms/assign")
            .form(&[
                ("coach_id", coach_id.as_str()),
                ("room_id", room.as_str()),
            ])
            .await;
        assert!(
            response.status_code().is_redirection(),
            "assign failed: {}",
            response.text()
        );
    }

    let mut conn = pool.get().unwrap();
    let all_rooms = rooms::table.load::<Room>(&mut conn).unwrap();
    let holding: Vec<&Room> = all_rooms
        .iter()
        .filter(|r| r.occupant_ids().contains(&coach_id))
        .collect();

    // at most one room holds any given coach
    assert_eq!(holding.len(), 1);
    assert_eq!(holding[0].id, room_b);
}

#[tokio::test]
async fn travel_with_a_bad_airport_code_is_rejected() {
    let server = server(pool());
    register_and_login(&server).await;

    let response = server
        .post("/travel/create")
        .form(&[
            ("coach_name", "Sam Ortiz"),
            ("preferred_airport", "Dallas/Fort Worth"),
        ])
        .await;

    assert_eq!(response.status_code(), 400);
    assert!(response.text().contains("three letter code"));
}

#[tokio::test]
async fn travel_pages_render_for_logged_in_users() {
    let server = server(pool());
    register_and_login(&server).await;

    for path in ["/travel", "/travel/rooms", "/teams", "/leagues", "/imports"]
    {
        let response = server.get(path).await;
        assert!(
            response.status_code().is_success(),
            "{path} failed: {}",
            response.text()
        );
    }
}

#[tokio::test]
async fn protected_pages_reject_anonymous_requests() {
    let server = server(pool());

    let response = server.get("/travel").await;

    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn unknown_routes_fall_through_to_404() {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    let app = create_app(pool());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/no-such-page")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
}
