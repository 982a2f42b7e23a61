use axum::extract::{Path, Query};
use diesel::prelude::*;
use hypertext::prelude::*;
use serde::Deserialize;

use crate::{
    auth::User,
    reminders::ActionReminder,
    schema::{action_reminders, teams, tournament_teams, tournaments},
    state::Conn,
    teams::Team,
    template::Page,
    tournaments::{
        Tournament,
        buckets::{SortOrder, sort_tournaments},
        registrations::TournamentTeam,
    },
    util_resp::{FailureResponse, StandardResponse, success},
    widgets::actions::Actions,
};

#[derive(Deserialize)]
pub struct SortParams {
    #[serde(default)]
    sort: Option<String>,
}

const SORT_OPTIONS: &[(&str, &str)] = &[
    ("date-asc", "Date ↑"),
    ("date-desc", "Date ↓"),
    ("name-asc", "Name A–Z"),
    ("name-desc", "Name Z–A"),
    ("status", "Status"),
];

pub async fn tournaments_list_page(
    Query(params): Query<SortParams>,
    user: User<true>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let order = params
        .sort
        .as_deref()
        .and_then(SortOrder::parse)
        .unwrap_or(SortOrder::DateAsc);

    let mut list = tournaments::table
        .load::<Tournament>(&mut *conn)
        .map_err(FailureResponse::from)?;
    sort_tournaments(&mut list, order);

    success(
        Page::new()
            .user(user)
            .active_nav("tournaments")
            .body(maud! {
                div class="d-flex justify-content-between align-items-center" {
                    h1 { "Tournaments" }
                    a class="btn btn-primary" href="/tournaments/create" {
                        "New tournament"
                    }
                }

                div class="d-flex gap-2 my-3" {
                    @for (key, label) in SORT_OPTIONS {
                        a class="btn btn-sm btn-outline-secondary"
                            href=(format!("/tournaments?sort={key}")) {
                            (label)
                        }
                    }
                }

                table class="table table-hover" {
                    thead {
                        tr {
                            th { "Name" }
                            th { "Gender" }
                            th { "Division" }
                            th { "Start" }
                            th { "Status" }
                            th { "Location" }
                        }
                    }
                    tbody {
                        @for tournament in &list {
                            tr {
                                td {
                                    a href=(format!("/tournaments/{}", tournament.id)) {
                                        (tournament.name)
                                    }
                                }
                                td { (tournament.gender_focus) }
                                td { (tournament.age_division_focus.as_deref().unwrap_or("—")) }
                                td {
                                    @if let Some(date) = tournament.start_date {
                                        (date.to_string())
                                        @if tournament.date_tentative { " (tentative)" }
                                    } @else { "TBD" }
                                }
                                td { (tournament.status) }
                                td { (tournament.location.as_deref().unwrap_or("—")) }
                            }
                        }
                        @if list.is_empty() {
                            tr { td colspan="6" class="text-muted" { "No tournaments yet." } }
                        }
                    }
                }
            })
            .render(),
    )
}

pub async fn tournament_detail_page(
    Path(tournament_id): Path<String>,
    user: User<true>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let tournament = Tournament::fetch(&tournament_id, &mut *conn)?;

    let registrations = tournament_teams::table
        .inner_join(teams::table)
        .filter(tournament_teams::tournament_id.eq(&tournament.id))
        .order(teams::name.asc())
        .select((TournamentTeam::as_select(), Team::as_select()))
        .load::<(TournamentTeam, Team)>(&mut *conn)
        .map_err(FailureResponse::from)?;

    let reminders = action_reminders::table
        .filter(action_reminders::tournament_id.eq(&tournament.id))
        .order(action_reminders::due_date.asc())
        .load::<ActionReminder>(&mut *conn)
        .map_err(FailureResponse::from)?;

    let unregistered_teams = {
        let registered: Vec<&str> =
            registrations.iter().map(|(_, t)| t.id.as_str()).collect();
        teams::table
            .order(teams::name.asc())
            .load::<Team>(&mut *conn)
            .map_err(FailureResponse::from)?
            .into_iter()
            .filter(|t| !registered.contains(&t.id.as_str()))
            .collect::<Vec<_>>()
    };

    success(
        Page::new()
            .user(user)
            .tournament(tournament.clone())
            .active_nav("tournaments")
            .body(maud! {
                div class="d-flex justify-content-between align-items-start" {
                    div {
                        h1 { (tournament.name) }
                        p class="text-muted mb-1" {
                            (tournament.gender_focus)
                            @if let Some(div) = &tournament.age_division_focus {
                                " · " (div)
                            }
                            " · " (tournament.status)
                            @if tournament.date_tentative { " · dates tentative" }
                        }
                        @if let Some(loc) = &tournament.location {
                            p class="mb-1" { (loc) }
                        }
                        @if let Some(start) = tournament.start_date {
                            p class="mb-1" {
                                (start.to_string())
                                @if let Some(end) = tournament.end_date {
                                    " – " (end.to_string())
                                }
                            }
                        }
                    }
                    Actions options=(&[
                        (format!("/tournaments/{}/edit", tournament.id).as_str(), "Edit")
                    ]);
                }

                div class="d-flex gap-2 my-3" {
                    a class="btn btn-outline-primary btn-sm" href=(format!("/tournaments/{}/finance", tournament.id)) {
                        "Finances"
                    }
                    a class="btn btn-outline-primary btn-sm" href="/travel/rooms" {
                        "Rooming board"
                    }
                }

                @if tournament.housing_required {
                    div class="card mb-3" {
                        div class="card-body" {
                            h5 class="card-title" { "Housing" }
                            p class="mb-1" {
                                "Partner: "
                                (tournament.housing_partner.as_deref().unwrap_or("TBD"))
                            }
                            @if let Some(opens) = tournament.housing_opens_date {
                                p class="mb-1" { "Opens: " (opens.to_string()) }
                            }
                            @if tournament.stay_play_required {
                                p class="mb-1 fw-bold" { "Stay-to-play applies" }
                            }
                            @if let Some(notes) = &tournament.housing_notes {
                                p class="mb-0 fst-italic" { (notes) }
                            }
                        }
                    }
                }

                h2 class="h4 mt-4" { "Registered teams" }
                table class="table" {
                    thead {
                        tr {
                            th { "Team" }
                            th { "Division" }
                            th { "Status" }
                            th { "Roster" }
                            th { }
                        }
                    }
                    tbody {
                        @for (registration, team) in &registrations {
                            tr {
                                td {
                                    a href=(format!("/teams/{}", team.id)) { (team.name) }
                                }
                                td { (registration.age_division_playing.as_deref().unwrap_or("—")) }
                                td {
                                    form action=(format!("/tournaments/{}/registrations/{}/status", tournament.id, registration.id))
                                        method="post" class="d-flex gap-1" {
                                        select class="form-select form-select-sm w-auto" name="registration_status" {
                                            @for status in crate::tournaments::registrations::REGISTRATION_STATUSES {
                                                @if *status == registration.registration_status {
                                                    option value=(status) selected { (status) }
                                                } @else {
                                                    option value=(status) { (status) }
                                                }
                                            }
                                        }
                                        button type="submit" class="btn btn-sm btn-outline-secondary" { "Set" }
                                    }
                                }
                                td {
                                    @if let Some(url) = &registration.roster_url {
                                        a href=(url) target="_blank" { "roster" }
                                    } @else { "—" }
                                }
                                td class="text-end" {
                                    form action=(format!("/tournaments/{}/registrations/{}/remove", tournament.id, registration.id))
                                        method="post"
                                        onsubmit="return confirm('Remove this registration?');" {
                                        button type="submit" class="btn btn-sm btn-link text-danger text-decoration-none" { "Remove" }
                                    }
                                }
                            }
                        }
                        @if registrations.is_empty() {
                            tr { td colspan="5" class="text-muted" { "No teams registered." } }
                        }
                    }
                }

                @if !unregistered_teams.is_empty() {
                    form action=(format!("/tournaments/{}/registrations", tournament.id))
                        method="post" class="row g-2 align-items-end mb-4" {
                        div class="col-auto" {
                            label class="form-label" { "Register a team" }
                            select class="form-select" name="team_id" required {
                                @for team in &unregistered_teams {
                                    option value=(team.id) { (team.name) }
                                }
                            }
                        }
                        div class="col-auto" {
                            label class="form-label" { "Division" }
                            input type="text" class="form-control" name="age_division_playing"
                                value=(tournament.age_division_focus.as_deref().unwrap_or(""));
                        }
                        div class="col-auto" {
                            button type="submit" class="btn btn-primary" { "Register" }
                        }
                    }
                }

                h2 class="h4 mt-4" { "Reminders" }
                ul class="list-group mb-3" {
                    @for reminder in &reminders {
                        li class="list-group-item d-flex justify-content-between align-items-center" {
                            div {
                                @if reminder.complete {
                                    s { (reminder.title) }
                                } @else {
                                    (reminder.title)
                                }
                                @if let Some(due) = reminder.due_date {
                                    span class="text-muted ms-2 small" { "due " (due.to_string()) }
                                }
                            }
                            div class="d-flex gap-1" {
                                @if !reminder.complete {
                                    form action=(format!("/reminders/{}/complete", reminder.id)) method="post" {
                                        button type="submit" class="btn btn-sm btn-outline-success" { "Done" }
                                    }
                                }
                                form action=(format!("/reminders/{}/delete", reminder.id)) method="post" {
                                    button type="submit" class="btn btn-sm btn-outline-danger" { "Delete" }
                                }
                            }
                        }
                    }
                    @if reminders.is_empty() {
                        li class="list-group-item text-muted" { "Nothing pending." }
                    }
                }
                form action="/reminders" method="post" class="row g-2 align-items-end" {
                    input type="hidden" name="tournament_id" value=(tournament.id);
                    div class="col-auto" {
                        label class="form-label" { "New reminder" }
                        input type="text" class="form-control" name="title" required;
                    }
                    div class="col-auto" {
                        label class="form-label" { "Due" }
                        input type="date" class="form-control" name="due_date";
                    }
                    div class="col-auto" {
                        button type="submit" class="btn btn-outline-primary" { "Add" }
                    }
                }
            })
            .render(),
    )
}
