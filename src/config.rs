use axum::{
    Router, middleware,
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use chrono::Utc;
use diesel::prelude::*;
use diesel_migrations::MigrationHarness;
use hypertext::prelude::*;

use crate::{
    MIGRATIONS,
    auth::{
        User,
        login::{do_login, login_page},
        register::{do_register, register_page},
    },
    finance::{create_transaction, delete_transaction, tournament_finance_page},
    imports::{
        coaches::do_import_coaches, imports_page,
        tournaments::do_import_tournaments,
    },
    leagues::{do_create_league, league_detail_page, leagues_page},
    reminders::{
        do_complete_reminder, do_create_reminder, do_delete_reminder,
    },
    schema::tournaments,
    state::{AppState, Conn, DbPool, commit_on_success},
    teams::manage::{
        do_create_team, do_delete_team, do_edit_team, do_merge_teams,
        team_detail_page, teams_page,
    },
    template::Page,
    tournaments::{
        Tournament,
        buckets::bucket_tournaments,
        create::{create_tournament_page, do_create_tournament},
        manage::{
            do_delete_tournament, do_edit_tournament, edit_tournament_page,
        },
        registrations::{
            do_register_team, do_remove_registration,
            do_update_registration_status,
        },
        view::{tournament_detail_page, tournaments_list_page},
    },
    travel::board::{
        delete_travel, do_assign_room, do_create_travel, do_edit_travel,
        do_room_together, edit_travel_page, mark_no_roommate,
        rooms_board_page, travel_board_page,
    },
    util_resp::{FailureResponse, StandardResponse, success},
};

pub async fn home(
    user: Option<User<true>>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let Some(user) = user else {
        return success(
            Page::new()
                .user_opt(None::<User<true>>)
                .body(maud! {
                    div class="text-center py-5" {
                        h1 { "Touchline" }
                        p class="lead" {
                            "Tournament registration, coach travel and "
                            "rooming for the club, in one place."
                        }
                        a class="btn btn-primary me-2" href="/login" { "Log in" }
                        a class="btn btn-outline-primary" href="/register" { "Register" }
                    }
                })
                .render(),
        );
    };

    let all = tournaments::table
        .load::<Tournament>(&mut *conn)
        .map_err(FailureResponse::from)?;
    let buckets = bucket_tournaments(&all, Utc::now().date_naive());

    success(
        Page::new()
            .user(user)
            .body(maud! {
                div class="d-flex justify-content-between align-items-center" {
                    h1 { "Dashboard" }
                    a class="btn btn-primary" href="/tournaments/create" {
                        "New tournament"
                    }
                }

                CalendarSection title=("This month") list=(&buckets.this_month);
                CalendarSection title=("Upcoming") list=(&buckets.upcoming);
                CalendarSection title=("Past") list=(&buckets.past);

                div class="row mt-4" {
                    div class="col-md-6" {
                        h2 class="h5" { "Boys calendar" }
                        @for (division, list) in &buckets.boys_by_age {
                            h3 class="h6 text-muted" { (division) }
                            ul {
                                @for tournament in list {
                                    li {
                                        a href=(format!("/tournaments/{}", tournament.id)) {
                                            (tournament.name)
                                        }
                                    }
                                }
                            }
                        }
                    }
                    div class="col-md-6" {
                        h2 class="h5" { "Girls calendar" }
                        @for (division, list) in &buckets.girls_by_age {
                            h3 class="h6 text-muted" { (division) }
                            ul {
                                @for tournament in list {
                                    li {
                                        a href=(format!("/tournaments/{}", tournament.id)) {
                                            (tournament.name)
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            })
            .render(),
    )
}

struct CalendarSection<'r> {
    title: &'static str,
    list: &'r [Tournament],
}

impl Renderable for CalendarSection<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            h2 class="h4 mt-4" { (self.title) }
            @if self.list.is_empty() {
                p class="text-muted small" { "Nothing here." }
            } @else {
                ul class="list-group" {
                    @for tournament in self.list {
                        li class="list-group-item d-flex justify-content-between" {
                            a href=(format!("/tournaments/{}", tournament.id)) {
                                (tournament.name)
                            }
                            span class="text-muted small" {
                                @if let Some(date) = tournament.start_date {
                                    (date.to_string()) " · "
                                }
                                (tournament.status)
                            }
                        }
                    }
                }
            }
        }
        .render_to(buffer)
    }
}

pub fn create_app(pool: DbPool) -> Router {
    {
        let mut conn = pool.get().unwrap();
        conn.run_pending_migrations(MIGRATIONS).unwrap();
    }

    let key = if let Ok(secret) = std::env::var("SECRET_KEY") {
        Key::from(secret.as_bytes())
    } else if cfg!(test) {
        Key::from(&[0; 64])
    } else {
        Key::generate()
    };

    Router::new()
        .route("/", get(home))
        .route("/login", get(login_page).post(do_login))
        .route("/register", get(register_page).post(do_register))
        .route("/tournaments", get(tournaments_list_page))
        .route(
            "/tournaments/create",
            get(create_tournament_page).post(do_create_tournament),
        )
        .route("/tournaments/:tournament_id", get(tournament_detail_page))
        .route(
            "/tournaments/:tournament_id/edit",
            get(edit_tournament_page).post(do_edit_tournament),
        )
        .route(
            "/tournaments/:tournament_id/delete",
            post(do_delete_tournament),
        )
        .route(
            "/tournaments/:tournament_id/registrations",
            post(do_register_team),
        )
        .route(
            "/tournaments/:tournament_id/registrations/:registration_id/status",
            post(do_update_registration_status),
        )
        .route(
            "/tournaments/:tournament_id/registrations/:registration_id/remove",
            post(do_remove_registration),
        )
        .route(
            "/tournaments/:tournament_id/finance",
            get(tournament_finance_page),
        )
        .route(
            "/tournaments/:tournament_id/finance/create",
            post(create_transaction),
        )
        .route(
            "/tournaments/:tournament_id/finance/:transaction_id/delete",
            post(delete_transaction),
        )
        .route("/teams", get(teams_page))
        .route("/teams/create", post(do_create_team))
        .route("/teams/merge", post(do_merge_teams))
        .route("/teams/:team_id", get(team_detail_page))
        .route("/teams/:team_id/edit", post(do_edit_team))
        .route("/teams/:team_id/delete", post(do_delete_team))
        .route("/travel", get(travel_board_page))
        .route("/travel/create", post(do_create_travel))
        .route("/travel/rooms", get(rooms_board_page))
        .route("/travel/rooms/assign", post(do_assign_room))
        .route("/travel/rooms/together", post(do_room_together))
        .route(
            "/travel/:travel_id/edit",
            get(edit_travel_page).post(do_edit_travel),
        )
        .route("/travel/:travel_id/delete", post(delete_travel))
        .route("/travel/:travel_id/no_roommate", post(mark_no_roommate))
        .route("/leagues", get(leagues_page))
        .route("/leagues/create", post(do_create_league))
        .route("/leagues/:league_id", get(league_detail_page))
        .route("/imports", get(imports_page))
        .route("/imports/coaches", post(do_import_coaches))
        .route("/imports/tournaments", post(do_import_tournaments))
        .route("/reminders", post(do_create_reminder))
        .route("/reminders/:reminder_id/complete", post(do_complete_reminder))
        .route("/reminders/:reminder_id/delete", post(do_delete_reminder))
        .layer(middleware::from_fn(commit_on_success))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(AppState { pool, key })
}
