use axum::{extract::Path, response::Redirect};
use axum_extra::extract::Form;
use diesel::prelude::*;
use hypertext::prelude::*;
use serde::Deserialize;

use crate::{
    auth::User,
    schema::{coach_travels, rooms, teams, tournaments},
    state::Conn,
    teams::Team,
    template::Page,
    tournaments::Tournament,
    travel::{
        CoachTravel,
        grouping::group_coaches,
        rooms::{
            Room, assign_coach_to_room, resolve_occupancy,
            room_coaches_together, split_active_completed,
        },
    },
    util_resp::{
        FailureResponse, StandardResponse, bad_request, see_other_ok, success,
    },
    widgets::alert::ErrorAlert,
};

/// The coach-centric view: every travel row in the club, grouped by coach.
pub async fn travel_board_page(
    user: User<true>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let travels = coach_travels::table
        .load::<CoachTravel>(&mut *conn)
        .map_err(FailureResponse::from)?;
    let all_teams = teams::table
        .load::<Team>(&mut *conn)
        .map_err(FailureResponse::from)?;
    let all_tournaments = tournaments::table
        .load::<Tournament>(&mut *conn)
        .map_err(FailureResponse::from)?;

    let groups = group_coaches(&travels, &all_teams, &all_tournaments);

    success(
        Page::new()
            .user(user)
            .active_nav("travel")
            .body(maud! {
                div class="d-flex justify-content-between align-items-center mb-3" {
                    h1 { "Coach Travel" }
                    a class="btn btn-outline-primary" href="/travel/rooms" {
                        "Rooming Board"
                    }
                }

                div class="card mb-4" {
                    div class="card-body bg-light" {
                        form action="/travel/create" method="post" class="row g-3 align-items-end" {
                            div class="col-md-3" {
                                label class="form-label" { "Coach name" }
                                input type="text" class="form-control" name="coach_name" required;
                            }
                            div class="col-md-3" {
                                label class="form-label" { "Tournament" }
                                select class="form-select" name="tournament_id" {
                                    option value="" selected { "None (team-level only)" }
                                    @for tournament in &all_tournaments {
                                        option value=(tournament.id) { (tournament.name) }
                                    }
                                }
                            }
                            div class="col-md-3" {
                                label class="form-label" { "Team" }
                                select class="form-select" name="team_id" {
                                    option value="" selected { "None" }
                                    @for team in &all_teams {
                                        option value=(team.id) { (team.name) }
                                    }
                                }
                            }
                            div class="col-md-2" {
                                label class="form-label" { "Airport" }
                                input type="text" class="form-control" name="preferred_airport" maxlength="3";
                            }
                            div class="col-md-1" {
                                button type="submit" class="btn btn-primary w-100" { "Add" }
                            }
                        }
                    }
                }

                div class="list-group" {
                    @for group in &groups {
                        div class="list-group-item p-4" {
                            div class="d-flex justify-content-between align-items-start" {
                                div {
                                    h5 class="mb-1 fw-bold" {
                                        (group.name)
                                        @if !group.preferred_airport.is_empty() {
                                            span class="text-muted fw-normal ms-2 fs-6" {
                                                "(" (group.preferred_airport) ")"
                                            }
                                        }
                                    }
                                    p class="mb-1 text-muted small" {
                                        (group.records.len())
                                        " travel record(s) · "
                                        (group.teams.len())
                                        " team(s) · "
                                        (group.tournaments.len())
                                        " tournament(s)"
                                    }
                                    @if !group.notes.is_empty() {
                                        p class="mb-0 small fst-italic" { (group.notes) }
                                    }
                                }
                            }
                            div class="d-flex flex-wrap gap-2 mt-2" {
                                @for team in &group.teams {
                                    span class="badge bg-secondary" { (team.name) }
                                }
                                @for tournament in &group.tournaments {
                                    span class="badge bg-success" { (tournament.name) }
                                }
                            }
                            div class="table-responsive mt-3" {
                                table class="table table-sm mb-0" {
                                    thead {
                                        tr {
                                            th { "Tournament" }
                                            th { "Flight" }
                                            th { "Hotel" }
                                            th { "Attendance" }
                                            th { "Complete" }
                                            th class="text-end" { "Actions" }
                                        }
                                    }
                                    tbody {
                                        @for record in &group.records {
                                            tr {
                                                td {
                                                    (record.tournament_id
                                                        .as_deref()
                                                        .and_then(|id| group.tournaments.iter().find(|t| t.id == id))
                                                        .map(|t| t.name.clone())
                                                        .unwrap_or_else(|| "—".to_string()))
                                                }
                                                td {
                                                    @if record.flight_booked {
                                                        (format!("${:.2}", record.flight_cost))
                                                    } @else { "not booked" }
                                                }
                                                td {
                                                    @if record.hotel_booked {
                                                        (format!("${:.2}", record.hotel_cost))
                                                    } @else { "not booked" }
                                                }
                                                td {
                                                    @if record.attendance_confirmed { "confirmed" } @else { "—" }
                                                }
                                                td {
                                                    @if record.travel_complete { "yes" } @else { "no" }
                                                }
                                                td class="text-end" {
                                                    a class="btn btn-sm btn-outline-secondary" href=(format!("/travel/{}/edit", record.id)) { "Edit" }
                                                    " "
                                                    form action=(format!("/travel/{}/delete", record.id)) method="post" class="d-inline"
                                                        onsubmit="return confirm('Delete this travel record?');" {
                                                        button type="submit" class="btn btn-sm btn-link text-danger text-decoration-none" { "Delete" }
                                                    }
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                    @if groups.is_empty() {
                        div class="list-group-item text-center text-muted py-5" { "No travel records yet." }
                    }
                }
            })
            .render(),
    )
}

/// Per-tournament rooming view: who shares which room, who still needs one.
pub async fn rooms_board_page(
    user: User<true>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let all_tournaments = tournaments::table
        .filter(tournaments::housing_required.eq(true))
        .load::<Tournament>(&mut *conn)
        .map_err(FailureResponse::from)?;

    let mut boards = Vec::new();
    for tournament in &all_tournaments {
        let travels = coach_travels::table
            .filter(coach_travels::tournament_id.eq(&tournament.id))
            .load::<CoachTravel>(&mut *conn)
            .map_err(FailureResponse::from)?;

        let tournament_rooms = rooms::table
            .filter(rooms::tournament_id.eq(&tournament.id))
            .load::<Room>(&mut *conn)
            .map_err(FailureResponse::from)?;

        let board = resolve_occupancy(tournament, &travels, &tournament_rooms);
        if !(board.room_groups.is_empty()
            && board.unassigned.is_empty()
            && board.no_roommate.is_empty())
        {
            boards.push(board);
        }
    }

    let (active, completed) = split_active_completed(boards);

    success(
        Page::new()
            .user(user)
            .active_nav("travel")
            .body(maud! {
                h1 { "Rooming Board" }

                h2 class="h4 mt-4" { "Active" }
                @for board in &active {
                    RoomingCard board=(board);
                }
                @if active.is_empty() {
                    p class="text-muted" { "Nothing in progress." }
                }

                h2 class="h4 mt-4" { "Completed" }
                @for board in &completed {
                    RoomingCard board=(board);
                }
                @if completed.is_empty() {
                    p class="text-muted" { "No tournament has fully completed travel yet." }
                }
            })
            .render(),
    )
}

struct RoomingCard<'r> {
    board: &'r crate::travel::rooms::TournamentOccupancy,
}

impl Renderable for RoomingCard<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        let board = self.board;
        let tournament = &board.tournament;
        maud! {
            div class="card mb-4" {
                div class="card-header d-flex justify-content-between align-items-center" {
                    div {
                        a class="fw-bold text-decoration-none" href=(format!("/tournaments/{}", tournament.id)) {
                            (tournament.name)
                        }
                        @if let Some(date) = tournament.start_date {
                            span class="text-muted ms-2 small" { (date.to_string()) }
                        }
                    }
                    @if board.all_complete {
                        span class="badge bg-success" { "Travel complete" }
                    } @else {
                        span class="badge bg-warning text-dark" { "In progress" }
                    }
                }
                div class="card-body" {
                    @for group in &board.room_groups {
                        div class="border rounded p-2 mb-2" {
                            div class="fw-medium" {
                                (group.room.room_number)
                                span class="text-muted ms-2 small" {
                                    (group.room.hotel) " · " (group.room.room_type)
                                }
                            }
                            ul class="mb-0" {
                                @for coach in &group.coaches {
                                    li {
                                        (coach.coach_name)
                                        @if coach.travel_complete {
                                            span class="badge bg-success ms-2" { "done" }
                                        }
                                    }
                                }
                            }
                        }
                    }

                    @if !board.unassigned.is_empty() {
                        @let together_form = format!("together-{}", tournament.id);
                        h6 class="mt-3" { "Needs a room" }
                        ul class="list-unstyled" {
                            @for coach in &board.unassigned {
                                li class="d-flex align-items-center gap-2 mb-1" {
                                    input class="form-check-input" type="checkbox"
                                        form=(together_form) name="coach_ids" value=(coach.id);
                                    (coach.coach_name)
                                    form action="/travel/rooms/assign" method="post" class="d-inline ms-2" {
                                        input type="hidden" name="coach_id" value=(coach.id);
                                        select class="form-select form-select-sm d-inline w-auto" name="room_id" required {
                                            option value="" selected disabled { "Assign to room..." }
                                            @for group in &board.room_groups {
                                                option value=(group.room.id) { (group.room.room_number) }
                                            }
                                        }
                                        button type="submit" class="btn btn-sm btn-outline-primary" { "Assign" }
                                    }
                                    form action=(format!("/travel/{}/no_roommate", coach.id)) method="post" class="d-inline" {
                                        button type="submit" class="btn btn-sm btn-outline-secondary" { "No roommate needed" }
                                    }
                                }
                            }
                        }
                        form id=(together_form) action="/travel/rooms/together" method="post" {
                            input type="hidden" name="tournament_id" value=(tournament.id);
                            button type="submit" class="btn btn-sm btn-primary" { "Room selected together" }
                        }
                    }

                    @if !board.no_roommate.is_empty() {
                        h6 class="mt-3" { "No roommate needed" }
                        ul {
                            @for coach in &board.no_roommate {
                                li { (coach.coach_name) }
                            }
                        }
                    }
                }
            }
        }
        .render_to(buffer)
    }
}

/// An empty airport field means "no preference"; anything else must be a
/// three-letter code and is stored uppercased.
fn checked_airport(
    raw: Option<String>,
) -> Result<Option<String>, String> {
    match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(code) => {
            crate::validation::is_valid_airport_code(code)?;
            Ok(Some(code.to_uppercase()))
        }
        None => Ok(None),
    }
}

#[derive(Deserialize)]
pub struct CreateTravelForm {
    coach_name: String,
    #[serde(default)]
    tournament_id: Option<String>,
    #[serde(default)]
    team_id: Option<String>,
    #[serde(default)]
    preferred_airport: Option<String>,
}

pub async fn do_create_travel(
    _user: User<true>,
    mut conn: Conn<true>,
    Form(form): Form<CreateTravelForm>,
) -> StandardResponse {
    if form.coach_name.trim().is_empty() {
        return bad_request(
            maud! { ErrorAlert msg = "Coach name is required."; }.render(),
        );
    }

    let preferred_airport =
        match checked_airport(form.preferred_airport) {
            Ok(code) => code,
            Err(e) => {
                return bad_request(
                    maud! { ErrorAlert msg = (&e); }.render(),
                );
            }
        };

    let travel = CoachTravel {
        id: uuid::Uuid::now_v7().to_string(),
        tournament_id: form.tournament_id.filter(|t| !t.is_empty()),
        team_id: form.team_id.filter(|t| !t.is_empty()),
        coach_name: form.coach_name,
        gender: None,
        preferred_airport,
        flight_booked: false,
        hotel_booked: false,
        travel_complete: false,
        attendance_confirmed: false,
        flight_confirmation: None,
        hotel_confirmation: None,
        flight_cost: 0.0,
        hotel_cost: 0.0,
        rooming_notes: None,
        notes: None,
        no_roommate_needed: false,
    };

    diesel::insert_into(coach_travels::table)
        .values(&travel)
        .execute(&mut *conn)
        .map_err(FailureResponse::from)?;

    see_other_ok(Redirect::to("/travel"))
}

pub async fn edit_travel_page(
    Path(travel_id): Path<String>,
    user: User<true>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let travel = CoachTravel::fetch(&travel_id, &mut *conn)?;

    success(
        Page::new()
            .user(user)
            .active_nav("travel")
            .body(maud! {
                h1 { "Edit travel: " (travel.coach_name) }
                form method="post" class="mt-4" {
                    div class="row g-3" {
                        div class="col-md-4" {
                            label class="form-label" { "Coach name" }
                            input type="text" class="form-control" name="coach_name" value=(travel.coach_name) required;
                        }
                        div class="col-md-2" {
                            label class="form-label" { "Gender" }
                            input type="text" class="form-control" name="gender" value=(travel.gender.as_deref().unwrap_or(""));
                        }
                        div class="col-md-2" {
                            label class="form-label" { "Airport" }
                            input type="text" class="form-control" name="preferred_airport" maxlength="3" value=(travel.preferred_airport.as_deref().unwrap_or(""));
                        }

                        div class="col-md-3" {
                            div class="form-check mt-4" {
                                @if travel.flight_booked {
                                    input class="form-check-input" type="checkbox" name="flight_booked" checked;
                                } @else {
                                    input class="form-check-input" type="checkbox" name="flight_booked";
                                }
                                label class="form-check-label" { "Flight booked" }
                            }
                        }
                        div class="col-md-3" {
                            label class="form-label" { "Flight cost" }
                            input type="number" step="0.01" class="form-control" name="flight_cost" value=(travel.flight_cost);
                        }
                        div class="col-md-3" {
                            label class="form-label" { "Flight confirmation" }
                            input type="text" class="form-control" name="flight_confirmation" value=(travel.flight_confirmation.as_deref().unwrap_or(""));
                        }

                        div class="col-md-3" {
                            div class="form-check mt-4" {
                                @if travel.hotel_booked {
                                    input class="form-check-input" type="checkbox" name="hotel_booked" checked;
                                } @else {
                                    input class="form-check-input" type="checkbox" name="hotel_booked";
                                }
                                label class="form-check-label" { "Hotel booked" }
                            }
                        }
                        div class="col-md-3" {
                            label class="form-label" { "Hotel cost" }
                            input type="number" step="0.01" class="form-control" name="hotel_cost" value=(travel.hotel_cost);
                        }
                        div class="col-md-3" {
                            label class="form-label" { "Hotel confirmation" }
                            input type="text" class="form-control" name="hotel_confirmation" value=(travel.hotel_confirmation.as_deref().unwrap_or(""));
                        }

                        div class="col-md-3" {
                            div class="form-check" {
                                @if travel.attendance_confirmed {
                                    input class="form-check-input" type="checkbox" name="attendance_confirmed" checked;
                                } @else {
                                    input class="form-check-input" type="checkbox" name="attendance_confirmed";
                                }
                                label class="form-check-label" { "Attendance confirmed" }
                            }
                        }
                        div class="col-md-3" {
                            div class="form-check" {
                                @if travel.travel_complete {
                                    input class="form-check-input" type="checkbox" name="travel_complete" checked;
                                } @else {
                                    input class="form-check-input" type="checkbox" name="travel_complete";
                                }
                                label class="form-check-label" { "Travel complete" }
                            }
                        }

                        div class="col-md-6" {
                            label class="form-label" { "Rooming notes" }
                            input type="text" class="form-control" name="rooming_notes" value=(travel.rooming_notes.as_deref().unwrap_or(""));
                        }
                        div class="col-md-6" {
                            label class="form-label" { "Notes" }
                            input type="text" class="form-control" name="notes" value=(travel.notes.as_deref().unwrap_or(""));
                        }
                    }
                    button type="submit" class="btn btn-primary mt-3" { "Save" }
                }
            })
            .render(),
    )
}

#[derive(Deserialize)]
pub struct EditTravelForm {
    coach_name: String,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default)]
    preferred_airport: Option<String>,
    #[serde(default)]
    flight_booked: Option<String>,
    #[serde(default)]
    flight_cost: Option<f64>,
    #[serde(default)]
    flight_confirmation: Option<String>,
    #[serde(default)]
    hotel_booked: Option<String>,
    #[serde(default)]
    hotel_cost: Option<f64>,
    #[serde(default)]
    hotel_confirmation: Option<String>,
    #[serde(default)]
    attendance_confirmed: Option<String>,
    #[serde(default)]
    travel_complete: Option<String>,
    #[serde(default)]
    rooming_notes: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

pub async fn do_edit_travel(
    Path(travel_id): Path<String>,
    _user: User<true>,
    mut conn: Conn<true>,
    Form(form): Form<EditTravelForm>,
) -> StandardResponse {
    let mut travel = CoachTravel::fetch(&travel_id, &mut *conn)?;

    travel.coach_name = form.coach_name;
    travel.gender = form.gender.filter(|s| !s.is_empty());
    travel.preferred_airport =
        match checked_airport(form.preferred_airport) {
            Ok(code) => code,
            Err(e) => {
                return bad_request(
                    maud! { ErrorAlert msg = (&e); }.render(),
                );
            }
        };
    travel.flight_booked = form.flight_booked.is_some();
    travel.flight_cost = form.flight_cost.unwrap_or(0.0);
    travel.flight_confirmation =
        form.flight_confirmation.filter(|s| !s.is_empty());
    travel.hotel_booked = form.hotel_booked.is_some();
    travel.hotel_cost = form.hotel_cost.unwrap_or(0.0);
    travel.hotel_confirmation =
        form.hotel_confirmation.filter(|s| !s.is_empty());
    travel.attendance_confirmed = form.attendance_confirmed.is_some();
    travel.travel_complete = form.travel_complete.is_some();
    travel.rooming_notes = form.rooming_notes.filter(|s| !s.is_empty());
    travel.notes = form.notes.filter(|s| !s.is_empty());

    diesel::update(
        coach_travels::table.filter(coach_travels::id.eq(&travel.id)),
    )
    .set((
        coach_travels::coach_name.eq(&travel.coach_name),
        coach_travels::gender.eq(&travel.gender),
        coach_travels::preferred_airport.eq(&travel.preferred_airport),
        coach_travels::flight_booked.eq(travel.flight_booked),
        coach_travels::flight_cost.eq(travel.flight_cost),
        coach_travels::flight_confirmation.eq(&travel.flight_confirmation),
        coach_travels::hotel_booked.eq(travel.hotel_booked),
        coach_travels::hotel_cost.eq(travel.hotel_cost),
        coach_travels::hotel_confirmation.eq(&travel.hotel_confirmation),
        coach_travels::attendance_confirmed.eq(travel.attendance_confirmed),
        coach_travels::travel_complete.eq(travel.travel_complete),
        coach_travels::rooming_notes.eq(&travel.rooming_notes),
        coach_travels::notes.eq(&travel.notes),
    ))
    .execute(&mut *conn)
    .map_err(FailureResponse::from)?;

    crate::travel::finance_sync::sync_travel_costs(&travel, &mut *conn)
        .map_err(FailureResponse::from)?;

    see_other_ok(Redirect::to("/travel"))
}

pub async fn delete_travel(
    Path(travel_id): Path<String>,
    _user: User<true>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let travel = CoachTravel::fetch(&travel_id, &mut *conn)?;

    if let Some(tid) = travel.tournament_id.as_deref() {
        crate::travel::rooms::remove_coach_from_rooms(
            tid,
            &travel.id,
            &mut *conn,
        )
        .map_err(FailureResponse::from)?;
    }

    diesel::delete(
        coach_travels::table.filter(coach_travels::id.eq(&travel.id)),
    )
    .execute(&mut *conn)
    .map_err(FailureResponse::from)?;

    see_other_ok(Redirect::to("/travel"))
}

#[derive(Deserialize)]
pub struct AssignRoomForm {
    coach_id: String,
    room_id: String,
}

pub async fn do_assign_room(
    _user: User<true>,
    mut conn: Conn<true>,
    Form(form): Form<AssignRoomForm>,
) -> StandardResponse {
    assign_coach_to_room(&form.coach_id, &form.room_id, &mut *conn)
        .map_err(FailureResponse::from)?;

    see_other_ok(Redirect::to("/travel/rooms"))
}

#[derive(Deserialize)]
pub struct RoomTogetherForm {
    tournament_id: String,
    #[serde(default)]
    coach_ids: Vec<String>,
}

pub async fn do_room_together(
    _user: User<true>,
    mut conn: Conn<true>,
    Form(form): Form<RoomTogetherForm>,
) -> StandardResponse {
    let tournament = Tournament::fetch(&form.tournament_id, &mut *conn)?;

    if form.coach_ids.len() < 2 {
        return bad_request(
            maud! {
                ErrorAlert msg = "Select at least two coaches to room together.";
            }
            .render(),
        );
    }

    room_coaches_together(&tournament, &form.coach_ids, &mut *conn)
        .map_err(FailureResponse::from)?;

    see_other_ok(Redirect::to("/travel/rooms"))
}

pub async fn mark_no_roommate(
    Path(travel_id): Path<String>,
    _user: User<true>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let travel = CoachTravel::fetch(&travel_id, &mut *conn)?;

    diesel::update(
        coach_travels::table.filter(coach_travels::id.eq(&travel.id)),
    )
    .set(coach_travels::no_roommate_needed.eq(true))
    .execute(&mut *conn)
    .map_err(FailureResponse::from)?;

    see_other_ok(Redirect::to("/travel/rooms"))
}
