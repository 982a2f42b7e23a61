use axum::response::Redirect;
use axum_extra::extract::Form;
use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use hypertext::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::User,
    leagues::League,
    schema::{leagues, tournaments},
    state::Conn,
    teams::CLUB_LOCATIONS,
    template::Page,
    tournaments::{
        GENDER_BOYS, GENDER_GIRLS, GENDER_MIXED, STATUS_COMPLETE,
        STATUS_IN_PROGRESS, STATUS_NOT_STARTED,
    },
    util_resp::{
        FailureResponse, StandardResponse, bad_request, see_other_ok, success,
    },
    widgets::alert::ErrorAlert,
};

pub async fn create_tournament_page(
    user: User<true>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let all_leagues = leagues::table
        .order(leagues::name.asc())
        .load::<League>(&mut *conn)
        .map_err(FailureResponse::from)?;

    success(
        Page::new()
            .user(user)
            .active_nav("tournaments")
            .body(maud! {
                h1 { "New tournament" }
                form method="post" class="mt-4" {
                    div class="mb-3" {
                        label for="tournamentName" class="form-label" { "Name" }
                        input type="text"
                              class="form-control"
                              id="tournamentName"
                              required
                              name="name";
                    }
                    div class="row" {
                        div class="col-md-4 mb-3" {
                            label class="form-label" { "Gender" }
                            select class="form-select" name="gender_focus" {
                                option value=(GENDER_BOYS) { (GENDER_BOYS) }
                                option value=(GENDER_GIRLS) { (GENDER_GIRLS) }
                                option value=(GENDER_MIXED) { (GENDER_MIXED) }
                            }
                        }
                        div class="col-md-4 mb-3" {
                            label class="form-label" { "Age division" }
                            input type="text" class="form-control" name="age_division_focus"
                                placeholder="e.g. 12U";
                        }
                        div class="col-md-4 mb-3" {
                            label class="form-label" { "Status" }
                            select class="form-select" name="status" {
                                option value=(STATUS_NOT_STARTED) { (STATUS_NOT_STARTED) }
                                option value=(STATUS_IN_PROGRESS) { (STATUS_IN_PROGRESS) }
                                option value=(STATUS_COMPLETE) { (STATUS_COMPLETE) }
                            }
                        }
                    }
                    div class="row" {
                        div class="col-md-4 mb-3" {
                            label class="form-label" { "Location" }
                            input type="text" class="form-control" name="location";
                        }
                        div class="col-md-3 mb-3" {
                            label class="form-label" { "Start date" }
                            input type="date" class="form-control" name="start_date";
                        }
                        div class="col-md-3 mb-3" {
                            label class="form-label" { "End date" }
                            input type="date" class="form-control" name="end_date";
                        }
                        div class="col-md-2 mb-3" {
                            div class="form-check mt-4" {
                                input class="form-check-input" type="checkbox" name="date_tentative" id="dateTentative";
                                label class="form-check-label" for="dateTentative" { "Tentative" }
                            }
                        }
                    }
                    div class="row" {
                        div class="col-md-4 mb-3" {
                            label class="form-label" { "League" }
                            select class="form-select" name="league_id" {
                                option value="" selected { "None (standalone)" }
                                @for league in &all_leagues {
                                    option value=(league.id) { (league.name) }
                                }
                            }
                        }
                        div class="col-md-4 mb-3" {
                            label class="form-label" { "Round" }
                            input type="text" class="form-control" name="round_name"
                                placeholder="Only for league play";
                        }
                        div class="col-md-4 mb-3" {
                            label class="form-label" { "Club location" }
                            select class="form-select" name="club_location" {
                                option value="" selected { "—" }
                                @for loc in CLUB_LOCATIONS {
                                    option value=(loc) { (loc) }
                                }
                            }
                        }
                    }
                    div class="row" {
                        div class="col-md-3 mb-3" {
                            div class="form-check mt-2" {
                                input class="form-check-input" type="checkbox" name="housing_required" id="housingReq" checked;
                                label class="form-check-label" for="housingReq" { "Housing required" }
                            }
                        }
                        div class="col-md-3 mb-3" {
                            div class="form-check mt-2" {
                                input class="form-check-input" type="checkbox" name="stay_play_required" id="stayPlay";
                                label class="form-check-label" for="stayPlay" { "Stay-to-play" }
                            }
                        }
                        div class="col-md-3 mb-3" {
                            label class="form-label" { "Housing partner" }
                            input type="text" class="form-control" name="housing_partner";
                        }
                        div class="col-md-3 mb-3" {
                            label class="form-label" { "Preferred airport" }
                            input type="text" class="form-control" name="preferred_airport" maxlength="3";
                        }
                    }
                    button type="submit" class="btn btn-primary" { "Create" }
                }
            })
            .render(),
    )
}

#[derive(Deserialize)]
pub struct TournamentForm {
    pub name: String,
    pub gender_focus: String,
    #[serde(default)]
    pub age_division_focus: Option<String>,
    pub status: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub date_tentative: Option<String>,
    #[serde(default)]
    pub league_id: Option<String>,
    #[serde(default)]
    pub round_name: Option<String>,
    #[serde(default)]
    pub club_location: Option<String>,
    #[serde(default)]
    pub housing_required: Option<String>,
    #[serde(default)]
    pub stay_play_required: Option<String>,
    #[serde(default)]
    pub housing_partner: Option<String>,
    #[serde(default)]
    pub preferred_airport: Option<String>,
}

pub(crate) fn parse_date(
    input: &Option<String>,
) -> Result<Option<NaiveDate>, FailureResponse> {
    match input.as_deref() {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse::<NaiveDate>().map(Some).map_err(|_| {
            FailureResponse::BadRequest(
                maud! { ErrorAlert msg = "Dates must be YYYY-MM-DD."; }
                    .render(),
            )
        }),
    }
}

fn nonempty(input: Option<String>) -> Option<String> {
    input.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub async fn do_create_tournament(
    _user: User<true>,
    mut conn: Conn<true>,
    Form(form): Form<TournamentForm>,
) -> StandardResponse {
    if form.name.trim().is_empty() {
        return bad_request(
            maud! { ErrorAlert msg = "Tournament name is required."; }
                .render(),
        );
    }
    if ![GENDER_BOYS, GENDER_GIRLS, GENDER_MIXED]
        .contains(&form.gender_focus.as_str())
    {
        return bad_request(
            maud! { ErrorAlert msg = "Unknown gender."; }.render(),
        );
    }

    let start_date = parse_date(&form.start_date)?;
    let end_date = parse_date(&form.end_date)?;

    let tid = Uuid::now_v7().to_string();
    diesel::insert_into(tournaments::table)
        .values((
            tournaments::id.eq(&tid),
            tournaments::name.eq(form.name.trim()),
            tournaments::league_id.eq(nonempty(form.league_id)),
            tournaments::round_name.eq(nonempty(form.round_name)),
            tournaments::age_division_focus
                .eq(nonempty(form.age_division_focus)),
            tournaments::gender_focus.eq(&form.gender_focus),
            tournaments::location.eq(nonempty(form.location)),
            tournaments::start_date.eq(start_date),
            tournaments::end_date.eq(end_date),
            tournaments::date_tentative.eq(form.date_tentative.is_some()),
            tournaments::status.eq(&form.status),
            tournaments::housing_required.eq(form.housing_required.is_some()),
            tournaments::stay_play_required
                .eq(form.stay_play_required.is_some()),
            tournaments::housing_partner.eq(nonempty(form.housing_partner)),
            tournaments::housing_email_sent.eq(false),
            tournaments::club_location.eq(nonempty(form.club_location)),
            tournaments::league_home_alert_complete.eq(false),
            tournaments::preferred_airport.eq(nonempty(
                form.preferred_airport,
            )
            .map(|a| a.to_uppercase())),
            tournaments::created_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut *conn)
        .map_err(FailureResponse::from)?;

    see_other_ok(Redirect::to(&format!("/tournaments/{tid}")))
}
