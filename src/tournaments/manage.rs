use axum::{extract::Path, response::Redirect};
use axum_extra::extract::Form;
use diesel::prelude::*;
use hypertext::prelude::*;

use crate::{
    auth::User,
    leagues::League,
    schema::{
        action_reminders, coach_travels, finance_transactions, leagues, rooms,
        tournament_teams, tournaments,
    },
    state::Conn,
    teams::CLUB_LOCATIONS,
    template::Page,
    tournaments::{
        GENDER_BOYS, GENDER_GIRLS, GENDER_MIXED, STATUS_COMPLETE,
        STATUS_IN_PROGRESS, STATUS_NOT_STARTED, Tournament,
        create::{TournamentForm, parse_date},
    },
    util_resp::{
        FailureResponse, StandardResponse, bad_request, see_other_ok, success,
    },
    widgets::alert::ErrorAlert,
};

pub async fn edit_tournament_page(
    Path(tournament_id): Path<String>,
    user: User<true>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let tournament = Tournament::fetch(&tournament_id, &mut *conn)?;
    let all_leagues = leagues::table
        .order(leagues::name.asc())
        .load::<League>(&mut *conn)
        .map_err(FailureResponse::from)?;

    success(
        Page::new()
            .user(user)
            .tournament(tournament.clone())
            .active_nav("tournaments")
            .body(maud! {
                h1 { "Edit " (tournament.name) }
                form method="post" class="mt-4" {
                    div class="mb-3" {
                        label class="form-label" { "Name" }
                        input type="text" class="form-control" name="name" value=(tournament.name) required;
                    }
                    div class="row" {
                        div class="col-md-4 mb-3" {
                            label class="form-label" { "Gender" }
                            select class="form-select" name="gender_focus" {
                                @for gender in [GENDER_BOYS, GENDER_GIRLS, GENDER_MIXED] {
                                    @if gender == tournament.gender_focus {
                                        option value=(gender) selected { (gender) }
                                    } @else {
                                        option value=(gender) { (gender) }
                                    }
                                }
                            }
                        }
                        div class="col-md-4 mb-3" {
                            label class="form-label" { "Age division" }
                            input type="text" class="form-control" name="age_division_focus"
                                value=(tournament.age_division_focus.as_deref().unwrap_or(""));
                        }
                        div class="col-md-4 mb-3" {
                            label class="form-label" { "Status" }
                            select class="form-select" name="status" {
                                @for status in [STATUS_NOT_STARTED, STATUS_IN_PROGRESS, STATUS_COMPLETE] {
                                    @if status == tournament.status {
                                        option value=(status) selected { (status) }
                                    } @else {
                                        option value=(status) { (status) }
                                    }
                                }
                            }
                        }
                    }
                    div class="row" {
                        div class="col-md-4 mb-3" {
                            label class="form-label" { "Location" }
                            input type="text" class="form-control" name="location"
                                value=(tournament.location.as_deref().unwrap_or(""));
                        }
                        div class="col-md-3 mb-3" {
                            label class="form-label" { "Start date" }
                            input type="date" class="form-control" name="start_date"
                                value=(tournament.start_date.map(|d| d.to_string()).unwrap_or_default());
                        }
                        div class="col-md-3 mb-3" {
                            label class="form-label" { "End date" }
                            input type="date" class="form-control" name="end_date"
                                value=(tournament.end_date.map(|d| d.to_string()).unwrap_or_default());
                        }
                        div class="col-md-2 mb-3" {
                            div class="form-check mt-4" {
                                @if tournament.date_tentative {
                                    input class="form-check-input" type="checkbox" name="date_tentative" checked;
                                } @else {
                                    input class="form-check-input" type="checkbox" name="date_tentative";
                                }
                                label class="form-check-label" { "Tentative" }
                            }
                        }
                    }
                    div class="row" {
                        div class="col-md-4 mb-3" {
                            label class="form-label" { "League" }
                            select class="form-select" name="league_id" {
                                option value="" { "None (standalone)" }
                                @for league in &all_leagues {
                                    @if Some(league.id.as_str()) == tournament.league_id.as_deref() {
                                        option value=(league.id) selected { (league.name) }
                                    } @else {
                                        option value=(league.id) { (league.name) }
                                    }
                                }
                            }
                        }
                        div class="col-md-4 mb-3" {
                            label class="form-label" { "Round" }
                            input type="text" class="form-control" name="round_name"
                                value=(tournament.round_name.as_deref().unwrap_or(""));
                        }
                        div class="col-md-4 mb-3" {
                            label class="form-label" { "Club location" }
                            select class="form-select" name="club_location" {
                                option value="" { "—" }
                                @for loc in CLUB_LOCATIONS {
                                    @if Some(*loc) == tournament.club_location.as_deref() {
                                        option value=(loc) selected { (loc) }
                                    } @else {
                                        option value=(loc) { (loc) }
                                    }
                                }
                            }
                        }
                    }
                    div class="row" {
                        div class="col-md-3 mb-3" {
                            div class="form-check mt-2" {
                                @if tournament.housing_required {
                                    input class="form-check-input" type="checkbox" name="housing_required" checked;
                                } @else {
                                    input class="form-check-input" type="checkbox" name="housing_required";
                                }
                                label class="form-check-label" { "Housing required" }
                            }
                        }
                        div class="col-md-3 mb-3" {
                            div class="form-check mt-2" {
                                @if tournament.stay_play_required {
                                    input class="form-check-input" type="checkbox" name="stay_play_required" checked;
                                } @else {
                                    input class="form-check-input" type="checkbox" name="stay_play_required";
                                }
                                label class="form-check-label" { "Stay-to-play" }
                            }
                        }
                        div class="col-md-3 mb-3" {
                            label class="form-label" { "Housing partner" }
                            input type="text" class="form-control" name="housing_partner"
                                value=(tournament.housing_partner.as_deref().unwrap_or(""));
                        }
                        div class="col-md-3 mb-3" {
                            label class="form-label" { "Preferred airport" }
                            input type="text" class="form-control" name="preferred_airport" maxlength="3"
                                value=(tournament.preferred_airport.as_deref().unwrap_or(""));
                        }
                    }
                    button type="submit" class="btn btn-primary" { "Save" }
                }

                form action=(format!("/tournaments/{}/delete", tournament.id))
                    method="post"
                    class="mt-4"
                    onsubmit="return confirm('Delete this tournament and everything attached to it (registrations, rooms, travel, finances, reminders)?');" {
                    button type="submit" class="btn btn-outline-danger" { "Delete tournament" }
                }
            })
            .render(),
    )
}

pub async fn do_edit_tournament(
    Path(tournament_id): Path<String>,
    _user: User<true>,
    mut conn: Conn<true>,
    Form(form): Form<TournamentForm>,
) -> StandardResponse {
    let tournament = Tournament::fetch(&tournament_id, &mut *conn)?;

    if form.name.trim().is_empty() {
        return bad_request(
            maud! { ErrorAlert msg = "Tournament name is required."; }
                .render(),
        );
    }

    let start_date = parse_date(&form.start_date)?;
    let end_date = parse_date(&form.end_date)?;

    let nonempty = |input: Option<String>| {
        input.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
    };

    diesel::update(
        tournaments::table.filter(tournaments::id.eq(&tournament.id)),
    )
    .set((
        tournaments::name.eq(form.name.trim()),
        tournaments::league_id.eq(nonempty(form.league_id)),
        tournaments::round_name.eq(nonempty(form.round_name)),
        tournaments::age_division_focus.eq(nonempty(form.age_division_focus)),
        tournaments::gender_focus.eq(&form.gender_focus),
        tournaments::location.eq(nonempty(form.location)),
        tournaments::start_date.eq(start_date),
        tournaments::end_date.eq(end_date),
        tournaments::date_tentative.eq(form.date_tentative.is_some()),
        tournaments::status.eq(&form.status),
        tournaments::housing_required.eq(form.housing_required.is_some()),
        tournaments::stay_play_required.eq(form.stay_play_required.is_some()),
        tournaments::housing_partner.eq(nonempty(form.housing_partner)),
        tournaments::club_location.eq(nonempty(form.club_location)),
        tournaments::preferred_airport
            .eq(nonempty(form.preferred_airport).map(|a| a.to_uppercase())),
    ))
    .execute(&mut *conn)
    .map_err(FailureResponse::from)?;

    see_other_ok(Redirect::to(&format!("/tournaments/{}", tournament.id)))
}

/// Application-level cascade: the schema has no ON DELETE clauses, so every
/// dependent table is cleared here before the tournament row itself.
#[tracing::instrument(skip(user, conn))]
pub async fn do_delete_tournament(
    Path(tournament_id): Path<String>,
    user: User<true>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let tournament = Tournament::fetch(&tournament_id, &mut *conn)?;

    diesel::delete(
        tournament_teams::table
            .filter(tournament_teams::tournament_id.eq(&tournament.id)),
    )
    .execute(&mut *conn)
    .map_err(FailureResponse::from)?;

    diesel::delete(
        rooms::table.filter(rooms::tournament_id.eq(&tournament.id)),
    )
    .execute(&mut *conn)
    .map_err(FailureResponse::from)?;

    diesel::delete(
        coach_travels::table
            .filter(coach_travels::tournament_id.eq(&tournament.id)),
    )
    .execute(&mut *conn)
    .map_err(FailureResponse::from)?;

    diesel::delete(
        finance_transactions::table
            .filter(finance_transactions::tournament_id.eq(&tournament.id)),
    )
    .execute(&mut *conn)
    .map_err(FailureResponse::from)?;

    diesel::delete(
        action_reminders::table
            .filter(action_reminders::tournament_id.eq(&tournament.id)),
    )
    .execute(&mut *conn)
    .map_err(FailureResponse::from)?;

    diesel::delete(
        tournaments::table.filter(tournaments::id.eq(&tournament.id)),
    )
    .execute(&mut *conn)
    .map_err(FailureResponse::from)?;

    tracing::info!(
        tournament = %tournament.name,
        by = %user.username,
        "deleted tournament and dependents"
    );

    see_other_ok(Redirect::to("/"))
}
