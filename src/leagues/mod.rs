use axum::{extract::Path, response::Redirect};
use axum_extra::extract::Form;
use chrono::{NaiveDateTime, Utc};
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use hypertext::prelude::*;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::User,
    schema::{leagues, tournaments},
    state::Conn,
    template::Page,
    tournaments::Tournament,
    util_resp::{
        FailureResponse, StandardResponse, bad_request, see_other_ok, success,
    },
    widgets::alert::ErrorAlert,
};

#[derive(
    Queryable, Selectable, Insertable, Serialize, Deserialize, Clone, Debug,
)]
#[diesel(table_name = leagues)]
#[diesel(check_for_backend(Sqlite))]
pub struct League {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<chrono::NaiveDate>,
    pub end_date: Option<chrono::NaiveDate>,
    /// JSON array of division names, in display order.
    pub age_divisions: String,
    pub contact_info: Option<String>,
    /// JSON array of round names, in play order.
    pub rounds: String,
    pub created_at: NaiveDateTime,
}

impl League {
    pub fn fetch(
        league_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<League, FailureResponse> {
        leagues::table
            .filter(leagues::id.eq(league_id))
            .first::<League>(&mut *conn)
            .optional()
            .map_err(FailureResponse::from)?
            .ok_or(FailureResponse::NotFound(()))
    }

    pub fn age_division_list(&self) -> Vec<String> {
        serde_json::from_str(&self.age_divisions).unwrap_or_default()
    }

    pub fn round_list(&self) -> Vec<String> {
        serde_json::from_str(&self.rounds).unwrap_or_default()
    }
}

/// League tournaments arranged round-by-round, each round split by age
/// division in the league's declared order. Tournaments whose round or
/// division is not declared on the league land in trailing groups so
/// nothing silently disappears.
pub fn group_by_round(
    league: &League,
    tournaments: &[Tournament],
) -> IndexMap<String, IndexMap<String, Vec<Tournament>>> {
    let mut grouped: IndexMap<String, IndexMap<String, Vec<Tournament>>> =
        IndexMap::new();

    for round in league.round_list() {
        let divisions = grouped.entry(round).or_default();
        for division in league.age_division_list() {
            divisions.entry(division).or_default();
        }
    }

    for tournament in tournaments {
        let round = tournament
            .round_name
            .clone()
            .unwrap_or_else(|| "Unscheduled".to_string());
        let division = tournament
            .age_division_focus
            .clone()
            .unwrap_or_else(|| "No Age Division".to_string());
        grouped
            .entry(round)
            .or_default()
            .entry(division)
            .or_default()
            .push(tournament.clone());
    }

    grouped
}

pub async fn leagues_page(
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
            .active_nav("leagues")
            .body(maud! {
                h1 { "Leagues" }

                div class="card mb-4" {
                    div class="card-body bg-light" {
                        form action="/leagues/create" method="post" class="row g-3 align-items-end" {
                            div class="col-md-3" {
                                label class="form-label" { "Name" }
                                input type="text" class="form-control" name="name" required;
                            }
                            div class="col-md-3" {
                                label class="form-label" { "Age divisions" }
                                input type="text" class="form-control" name="age_divisions"
                                    placeholder="12U, 13U, 14U" required;
                            }
                            div class="col-md-3" {
                                label class="form-label" { "Rounds" }
                                input type="text" class="form-control" name="rounds"
                                    placeholder="Round 1, Round 2, Finals";
                            }
                            div class="col-md-2" {
                                label class="form-label" { "Contact" }
                                input type="text" class="form-control" name="contact_info";
                            }
                            div class="col-md-1" {
                                button type="submit" class="btn btn-primary w-100" { "Add" }
                            }
                        }
                    }
                }

                ul class="list-group" {
                    @for league in &all_leagues {
                        li class="list-group-item d-flex justify-content-between align-items-center" {
                            a href=(format!("/leagues/{}", league.id)) { (league.name) }
                            span class="text-muted small" {
                                (league.age_division_list().join(" · "))
                            }
                        }
                    }
                    @if all_leagues.is_empty() {
                        li class="list-group-item text-muted" { "No leagues yet." }
                    }
                }
            })
            .render(),
    )
}

#[derive(Deserialize)]
pub struct CreateLeagueForm {
    name: String,
    /// Comma-separated in the form, stored as JSON.
    age_divisions: String,
    #[serde(default)]
    rounds: Option<String>,
    #[serde(default)]
    contact_info: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub async fn do_create_league(
    _user: User<true>,
    mut conn: Conn<true>,
    Form(form): Form<CreateLeagueForm>,
) -> StandardResponse {
    if form.name.trim().is_empty() {
        return bad_request(
            maud! { ErrorAlert msg = "League name is required."; }.render(),
        );
    }
    let divisions = split_list(&form.age_divisions);
    if divisions.is_empty() {
        return bad_request(
            maud! { ErrorAlert msg = "A league needs at least one age division."; }
                .render(),
        );
    }
    let rounds = split_list(form.rounds.as_deref().unwrap_or(""));

    let league = League {
        id: Uuid::now_v7().to_string(),
        name: form.name.trim().to_string(),
        description: form.description.filter(|d| !d.trim().is_empty()),
        start_date: None,
        end_date: None,
        age_divisions: serde_json::to_string(&divisions)
            .map_err(|_| FailureResponse::ServerError(()))?,
        contact_info: form.contact_info.filter(|c| !c.trim().is_empty()),
        rounds: serde_json::to_string(&rounds)
            .map_err(|_| FailureResponse::ServerError(()))?,
        created_at: Utc::now().naive_utc(),
    };

    diesel::insert_into(leagues::table)
        .values(&league)
        .execute(&mut *conn)
        .map_err(FailureResponse::from)?;

    see_other_ok(Redirect::to(&format!("/leagues/{}", league.id)))
}

pub async fn league_detail_page(
    Path(league_id): Path<String>,
    user: User<true>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let league = League::fetch(&league_id, &mut *conn)?;

    let league_tournaments = tournaments::table
        .filter(tournaments::league_id.eq(&league.id))
        .order(tournaments::start_date.asc())
        .load::<Tournament>(&mut *conn)
        .map_err(FailureResponse::from)?;

    let grouped = group_by_round(&league, &league_tournaments);

    success(
        Page::new()
            .user(user)
            .active_nav("leagues")
            .body(maud! {
                h1 { (league.name) }
                @if let Some(description) = &league.description {
                    p { (description) }
                }
                @if let Some(contact) = &league.contact_info {
                    p class="text-muted small" { "Contact: " (contact) }
                }

                @for (round, divisions) in &grouped {
                    h2 class="h4 mt-4" { (round) }
                    @for (division, entries) in divisions {
                        h3 class="h6 text-muted" { (division) }
                        @if entries.is_empty() {
                            p class="text-muted small fst-italic" { "Nothing scheduled." }
                        } @else {
                            ul {
                                @for tournament in entries {
                                    li {
                                        a href=(format!("/tournaments/{}", tournament.id)) {
                                            (tournament.name)
                                        }
                                        " — " (tournament.status)
                                        @if let Some(date) = tournament.start_date {
                                            span class="text-muted ms-1" { "(" (date.to_string()) ")" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
                @if grouped.is_empty() {
                    p class="text-muted" { "No rounds or tournaments yet." }
                }
            })
            .render(),
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn league(divisions: &[&str], rounds: &[&str]) -> League {
        League {
            id: Uuid::now_v7().to_string(),
            name: "Mountain League".to_string(),
            description: None,
            start_date: None,
            end_date: None,
            age_divisions: serde_json::to_string(divisions).unwrap(),
            contact_info: None,
            rounds: serde_json::to_string(rounds).unwrap(),
            created_at: Utc::now().naive_utc(),
        }
    }

    fn tournament(round: Option<&str>, division: Option<&str>) -> Tournament {
        Tournament {
            id: Uuid::now_v7().to_string(),
            name: "League stop".to_string(),
            league_id: None,
            round_name: round.map(|r| r.to_string()),
            age_division_focus: division.map(|d| d.to_string()),
            gender_focus: "Girls".to_string(),
            location: None,
            start_date: None,
            end_date: None,
            date_tentative: false,
            status: "Not Started".to_string(),
            housing_required: true,
            stay_play_required: false,
            housing_partner: None,
            housing_opens_date: None,
            housing_email_sent: false,
            housing_notes: None,
            contact_info: None,
            stay_play_requirements: None,
            club_location: None,
            league_home_alert_complete: false,
            preferred_airport: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn grouping_follows_declared_round_and_division_order() {
        let league = league(&["12U", "13U"], &["Round 1", "Round 2"]);
        let ts = vec![
            tournament(Some("Round 2"), Some("13U")),
            tournament(Some("Round 1"), Some("12U")),
        ];

        let grouped = group_by_round(&league, &ts);

        let rounds: Vec<&String> = grouped.keys().collect();
        assert_eq!(rounds, ["Round 1", "Round 2"]);
        assert_eq!(grouped["Round 1"]["12U"].len(), 1);
        assert_eq!(grouped["Round 2"]["13U"].len(), 1);
        assert!(grouped["Round 1"]["13U"].is_empty());
    }

    #[test]
    fn undeclared_rounds_still_appear() {
        let league = league(&["12U"], &["Round 1"]);
        let ts = vec![tournament(None, None)];

        let grouped = group_by_round(&league, &ts);

        assert_eq!(grouped["Unscheduled"]["No Age Division"].len(), 1);
    }
}
