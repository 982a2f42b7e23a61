use axum::{extract::Path, response::Redirect};
use axum_extra::extract::Form;
use chrono::Utc;
use diesel::prelude::*;
use hypertext::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::User,
    schema::{coach_travels, teams, tournament_teams, tournaments},
    state::Conn,
    teams::{CLUB_LOCATIONS, ORGANIZATIONS, Team, duplicate_sets},
    template::Page,
    tournaments::Tournament,
    util_resp::{
        FailureResponse, StandardResponse, bad_request, see_other_ok, success,
    },
    widgets::alert::ErrorAlert,
};

pub async fn teams_page(
    user: User<true>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let all_teams = teams::table
        .order(teams::name.asc())
        .load::<Team>(&mut *conn)
        .map_err(FailureResponse::from)?;

    let duplicates = duplicate_sets(&all_teams);

    success(
        Page::new()
            .user(user)
            .active_nav("teams")
            .body(maud! {
                h1 { "Teams" }

                @if !duplicates.is_empty() {
                    div class="card border-warning mb-4" {
                        div class="card-header bg-warning-subtle" {
                            "Possible duplicates"
                        }
                        div class="card-body" {
                            @for set in &duplicates {
                                form action="/teams/merge" method="post"
                                    class="mb-3"
                                    onsubmit="return confirm('Merge these teams? Travel records and registrations move to the selected team; the others are deleted.');" {
                                    p class="mb-1" {
                                        @for team in set {
                                            span class="badge bg-secondary me-1" { (team.name) }
                                        }
                                    }
                                    div class="d-flex gap-2 align-items-center" {
                                        select class="form-select form-select-sm w-auto" name="survivor_id" {
                                            @for (i, team) in set.iter().enumerate() {
                                                @if i == 0 {
                                                    option value=(team.id) selected { "Keep " (team.name) }
                                                } @else {
                                                    option value=(team.id) { "Keep " (team.name) }
                                                }
                                            }
                                        }
                                        @for team in set {
                                            input type="hidden" name="team_ids" value=(team.id);
                                        }
                                        button type="submit" class="btn btn-sm btn-warning" { "Merge" }
                                    }
                                }
                            }
                        }
                    }
                }

                div class="card mb-4" {
                    div class="card-body bg-light" {
                        form action="/teams/create" method="post" class="row g-3 align-items-end" {
                            div class="col-md-4" {
                                label class="form-label" { "Name" }
                                input type="text" class="form-control" name="name" required;
                            }
                            div class="col-md-3" {
                                label class="form-label" { "Organization" }
                                select class="form-select" name="organization" {
                                    @for org in ORGANIZATIONS {
                                        option value=(org) { (org) }
                                    }
                                }
                            }
                            div class="col-md-2" {
                                label class="form-label" { "Location" }
                                select class="form-select" name="club_location" {
                                    option value="" selected { "—" }
                                    @for loc in CLUB_LOCATIONS {
                                        option value=(loc) { (loc) }
                                    }
                                }
                            }
                            div class="col-md-2" {
                                label class="form-label" { "Home city" }
                                input type="text" class="form-control" name="home_city";
                            }
                            div class="col-md-1" {
                                button type="submit" class="btn btn-primary w-100" { "Add" }
                            }
                        }
                    }
                }

                table class="table table-hover" {
                    thead {
                        tr {
                            th { "Name" }
                            th { "Organization" }
                            th { "Location" }
                            th { "Home city" }
                        }
                    }
                    tbody {
                        @for team in &all_teams {
                            tr {
                                td { a href=(format!("/teams/{}", team.id)) { (team.name) } }
                                td { (team.organization) }
                                td { (team.club_location.as_deref().unwrap_or("—")) }
                                td { (team.home_city.as_deref().unwrap_or("—")) }
                            }
                        }
                        @if all_teams.is_empty() {
                            tr { td colspan="4" class="text-muted" { "No teams yet." } }
                        }
                    }
                }
            })
            .render(),
    )
}

#[derive(Deserialize)]
pub struct TeamForm {
    name: String,
    organization: String,
    #[serde(default)]
    club_location: Option<String>,
    #[serde(default)]
    home_city: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

pub async fn do_create_team(
    _user: User<true>,
    mut conn: Conn<true>,
    Form(form): Form<TeamForm>,
) -> StandardResponse {
    if form.name.trim().is_empty() {
        return bad_request(
            maud! { ErrorAlert msg = "Team name is required."; }.render(),
        );
    }
    if !ORGANIZATIONS.contains(&form.organization.as_str()) {
        return bad_request(
            maud! { ErrorAlert msg = "Unknown organization."; }.render(),
        );
    }

    diesel::insert_into(teams::table)
        .values(&Team {
            id: Uuid::now_v7().to_string(),
            name: form.name.trim().to_string(),
            organization: form.organization,
            club_location: form.club_location.filter(|l| !l.is_empty()),
            home_city: form
                .home_city
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            notes: form.notes.filter(|n| !n.trim().is_empty()),
            created_at: Utc::now().naive_utc(),
        })
        .execute(&mut *conn)
        .map_err(FailureResponse::from)?;

    see_other_ok(Redirect::to("/teams"))
}

pub async fn team_detail_page(
    Path(team_id): Path<String>,
    user: User<true>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let team = Team::fetch(&team_id, &mut *conn)?;

    let appearances = tournament_teams::table
        .inner_join(tournaments::table)
        .filter(tournament_teams::team_id.eq(&team.id))
        .order(tournaments::start_date.desc())
        .select(Tournament::as_select())
        .load::<Tournament>(&mut *conn)
        .map_err(FailureResponse::from)?;

    let coach_names: Vec<String> = coach_travels::table
        .filter(coach_travels::team_id.eq(&team.id))
        .select(coach_travels::coach_name)
        .distinct()
        .order(coach_travels::coach_name.asc())
        .load::<String>(&mut *conn)
        .map_err(FailureResponse::from)?;

    success(
        Page::new()
            .user(user)
            .active_nav("teams")
            .body(maud! {
                h1 { (team.name) }
                p class="text-muted" {
                    (team.organization)
                    @if let Some(loc) = &team.club_location { " · " (loc) }
                    @if let Some(city) = &team.home_city { " · " (city) }
                }
                @if let Some(notes) = &team.notes {
                    p class="fst-italic" { (notes) }
                }

                form method="post" action=(format!("/teams/{}/edit", team.id)) class="row g-3 align-items-end mb-4" {
                    div class="col-md-4" {
                        label class="form-label" { "Name" }
                        input type="text" class="form-control" name="name" value=(team.name) required;
                    }
                    div class="col-md-3" {
                        label class="form-label" { "Organization" }
                        select class="form-select" name="organization" {
                            @for org in ORGANIZATIONS {
                                @if *org == team.organization {
                                    option value=(org) selected { (org) }
                                } @else {
                                    option value=(org) { (org) }
                                }
                            }
                        }
                    }
                    div class="col-md-2" {
                        label class="form-label" { "Location" }
                        select class="form-select" name="club_location" {
                            option value="" { "—" }
                            @for loc in CLUB_LOCATIONS {
                                @if Some(*loc) == team.club_location.as_deref() {
                                    option value=(loc) selected { (loc) }
                                } @else {
                                    option value=(loc) { (loc) }
                                }
                            }
                        }
                    }
                    div class="col-md-2" {
                        label class="form-label" { "Home city" }
                        input type="text" class="form-control" name="home_city"
                            value=(team.home_city.as_deref().unwrap_or(""));
                    }
                    div class="col-md-1" {
                        button type="submit" class="btn btn-primary w-100" { "Save" }
                    }
                }

                h2 class="h4" { "Tournament history" }
                ul {
                    @for tournament in &appearances {
                        li {
                            a href=(format!("/tournaments/{}", tournament.id)) { (tournament.name) }
                            @if let Some(date) = tournament.start_date {
                                span class="text-muted ms-1" { "(" (date.to_string()) ")" }
                            }
                        }
                    }
                    @if appearances.is_empty() {
                        li class="text-muted" { "No registrations." }
                    }
                }

                h2 class="h4" { "Known coaches" }
                ul {
                    @for name in &coach_names {
                        li { (name) }
                    }
                    @if coach_names.is_empty() {
                        li class="text-muted" { "No travel records yet." }
                    }
                }

                form action=(format!("/teams/{}/delete", team.id))
                    method="post"
                    class="mt-4"
                    onsubmit="return confirm('Delete this team, its registrations and its travel records?');" {
                    button type="submit" class="btn btn-outline-danger" { "Delete team" }
                }
            })
            .render(),
    )
}

pub async fn do_edit_team(
    Path(team_id): Path<String>,
    _user: User<true>,
    mut conn: Conn<true>,
    Form(form): Form<TeamForm>,
) -> StandardResponse {
    let team = Team::fetch(&team_id, &mut *conn)?;

    if form.name.trim().is_empty() {
        return bad_request(
            maud! { ErrorAlert msg = "Team name is required."; }.render(),
        );
    }

    diesel::update(teams::table.filter(teams::id.eq(&team.id)))
        .set((
            teams::name.eq(form.name.trim()),
            teams::organization.eq(&form.organization),
            teams::club_location
                .eq(form.club_location.filter(|l| !l.is_empty())),
            teams::home_city.eq(form
                .home_city
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())),
        ))
        .execute(&mut *conn)
        .map_err(FailureResponse::from)?;

    see_other_ok(Redirect::to(&format!("/teams/{}", team.id)))
}

pub async fn do_delete_team(
    Path(team_id): Path<String>,
    _user: User<true>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let team = Team::fetch(&team_id, &mut *conn)?;

    delete_team_records(&team, &mut *conn)?;

    see_other_ok(Redirect::to("/teams"))
}

/// Application-level cascade: registrations and travel records go with the
/// team, and each deleted travel record is swept out of any room occupant
/// list that still names it.
pub fn delete_team_records(
    team: &Team,
    conn: &mut impl diesel::connection::LoadConnection<
        Backend = diesel::sqlite::Sqlite,
    >,
) -> Result<(), FailureResponse> {
    let travels: Vec<(String, Option<String>)> = coach_travels::table
        .filter(coach_travels::team_id.eq(&team.id))
        .select((coach_travels::id, coach_travels::tournament_id))
        .load(&mut *conn)
        .map_err(FailureResponse::from)?;

    for (travel_id, tournament_id) in &travels {
        if let Some(tid) = tournament_id.as_deref() {
            crate::travel::rooms::remove_coach_from_rooms(
                tid, travel_id, &mut *conn,
            )
            .map_err(FailureResponse::from)?;
        }
    }

    diesel::delete(
        tournament_teams::table
            .filter(tournament_teams::team_id.eq(&team.id)),
    )
    .execute(&mut *conn)
    .map_err(FailureResponse::from)?;

    diesel::delete(
        coach_travels::table.filter(coach_travels::team_id.eq(&team.id)),
    )
    .execute(&mut *conn)
    .map_err(FailureResponse::from)?;

    diesel::delete(teams::table.filter(teams::id.eq(&team.id)))
        .execute(&mut *conn)
        .map_err(FailureResponse::from)?;

    Ok(())
}

#[derive(Deserialize)]
pub struct MergeForm {
    survivor_id: String,
    #[serde(default)]
    team_ids: Vec<String>,
}

/// Repoints travel records and registrations at the survivor, then deletes
/// the losers. Registrations the survivor already holds for a tournament are
/// dropped rather than duplicated.
#[tracing::instrument(skip(_user, conn, form))]
pub async fn do_merge_teams(
    _user: User<true>,
    mut conn: Conn<true>,
    Form(form): Form<MergeForm>,
) -> StandardResponse {
    if !form.team_ids.contains(&form.survivor_id) {
        return bad_request(
            maud! { ErrorAlert msg = "The surviving team must be part of the merge set."; }
                .render(),
        );
    }

    let survivor = Team::fetch(&form.survivor_id, &mut *conn)?;
    let losers: Vec<&str> = form
        .team_ids
        .iter()
        .map(String::as_str)
        .filter(|id| *id != survivor.id)
        .collect();

    merge_into(&survivor, &losers, &mut *conn)?;

    see_other_ok(Redirect::to("/teams"))
}

pub fn merge_into(
    survivor: &Team,
    loser_ids: &[&str],
    conn: &mut impl diesel::connection::LoadConnection<
        Backend = diesel::sqlite::Sqlite,
    >,
) -> Result<(), FailureResponse> {
    for loser_id in loser_ids {
        let loser = Team::fetch(loser_id, &mut *conn)?;

        diesel::update(
            coach_travels::table
                .filter(coach_travels::team_id.eq(&loser.id)),
        )
        .set(coach_travels::team_id.eq(&survivor.id))
        .execute(&mut *conn)
        .map_err(FailureResponse::from)?;

        let survivor_tournaments: Vec<String> = tournament_teams::table
            .filter(tournament_teams::team_id.eq(&survivor.id))
            .select(tournament_teams::tournament_id)
            .load::<String>(&mut *conn)
            .map_err(FailureResponse::from)?;

        diesel::delete(
            tournament_teams::table
                .filter(tournament_teams::team_id.eq(&loser.id))
                .filter(
                    tournament_teams::tournament_id
                        .eq_any(&survivor_tournaments),
                ),
        )
        .execute(&mut *conn)
        .map_err(FailureResponse::from)?;

        diesel::update(
            tournament_teams::table
                .filter(tournament_teams::team_id.eq(&loser.id)),
        )
        .set(tournament_teams::team_id.eq(&survivor.id))
        .execute(&mut *conn)
        .map_err(FailureResponse::from)?;

        diesel::delete(teams::table.filter(teams::id.eq(&loser.id)))
            .execute(&mut *conn)
            .map_err(FailureResponse::from)?;

        tracing::info!(
            loser = %loser.name,
            survivor = %survivor.name,
            "merged duplicate team"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use diesel::prelude::*;
    use diesel_migrations::MigrationHarness;
    use uuid::Uuid;

    use crate::{
        MIGRATIONS,
        schema::{coach_travels, rooms, teams, tournament_teams, tournaments},
        travel::rooms::Room,
    };

    fn conn() -> SqliteConnection {
        let mut conn = SqliteConnection::establish(":memory:").unwrap();
        conn.run_pending_migrations(MIGRATIONS).unwrap();
        conn
    }

    fn seed_team(conn: &mut SqliteConnection, name: &str) -> String {
        let id = Uuid::now_v7().to_string();
        diesel::insert_into(teams::table)
            .values((
                teams::id.eq(&id),
                teams::name.eq(name),
                teams::organization.eq("Academy Girls"),
                teams::created_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)
            .unwrap();
        id
    }

    /// The merge scenario: two team rows with colliding normalized names end
    /// up as one, with travel records and registrations pointing at the
    /// survivor.
    #[test]
    fn merge_repoints_travel_and_registrations() {
        let mut conn = conn();
        let survivor = seed_team(&mut conn, "Vipers 12U");
        let loser = seed_team(&mut conn, "vipers 12u");

        let tid = Uuid::now_v7().to_string();
        diesel::insert_into(tournaments::table)
            .values((
                tournaments::id.eq(&tid),
                tournaments::name.eq("Spring Cup"),
                tournaments::gender_focus.eq("Girls"),
                tournaments::status.eq("Not Started"),
                tournaments::created_at.eq(Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .unwrap();
        diesel::insert_into(tournament_teams::table)
            .values((
                tournament_teams::id.eq(Uuid::now_v7().to_string()),
                tournament_teams::tournament_id.eq(&tid),
                tournament_teams::team_id.eq(&loser),
                tournament_teams::registration_status.eq("Registered"),
            ))
            .execute(&mut conn)
            .unwrap();
        diesel::insert_into(coach_travels::table)
            .values((
                coach_travels::id.eq(Uuid::now_v7().to_string()),
                coach_travels::team_id.eq(&loser),
                coach_travels::coach_name.eq("Sam Ortiz"),
            ))
            .execute(&mut conn)
            .unwrap();

        let survivor_team =
            crate::teams::Team::fetch(&survivor, &mut conn).unwrap();
        super::merge_into(&survivor_team, &[loser.as_str()], &mut conn)
            .unwrap();

        let remaining: i64 =
            teams::table.count().get_result(&mut conn).unwrap();
        assert_eq!(remaining, 1);

        let travel_team: Option<String> = coach_travels::table
            .select(coach_travels::team_id)
            .first(&mut conn)
            .unwrap();
        assert_eq!(travel_team.as_deref(), Some(survivor.as_str()));

        let reg_team: String = tournament_teams::table
            .select(tournament_teams::team_id)
            .first(&mut conn)
            .unwrap();
        assert_eq!(reg_team, survivor);
    }

    #[test]
    fn deleting_a_team_clears_its_coaches_out_of_rooms() {
        let mut conn = conn();
        let team_id = seed_team(&mut conn, "Vipers 12U");

        let tid = Uuid::now_v7().to_string();
        diesel::insert_into(tournaments::table)
            .values((
                tournaments::id.eq(&tid),
                tournaments::name.eq("Spring Cup"),
                tournaments::gender_focus.eq("Girls"),
                tournaments::status.eq("Not Started"),
                tournaments::created_at.eq(Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .unwrap();

        let travel_id = Uuid::now_v7().to_string();
        diesel::insert_into(coach_travels::table)
            .values((
                coach_travels::id.eq(&travel_id),
                coach_travels::team_id.eq(&team_id),
                coach_travels::tournament_id.eq(&tid),
                coach_travels::coach_name.eq("Sam Ortiz"),
            ))
            .execute(&mut conn)
            .unwrap();

        diesel::insert_into(rooms::table)
            .values((
                rooms::id.eq(Uuid::now_v7().to_string()),
                rooms::tournament_id.eq(&tid),
                rooms::room_number.eq("Room 1"),
                rooms::hotel.eq("Hilton"),
                rooms::room_type.eq("Double"),
                rooms::occupants
                    .eq(Room::encode_occupants(&[travel_id.clone()])),
            ))
            .execute(&mut conn)
            .unwrap();

        let team = crate::teams::Team::fetch(&team_id, &mut conn).unwrap();
        super::delete_team_records(&team, &mut conn).unwrap();

        let travel_count: i64 =
            coach_travels::table.count().get_result(&mut conn).unwrap();
        assert_eq!(travel_count, 0);

        let room = rooms::table.first::<Room>(&mut conn).unwrap();
        assert!(room.occupant_ids().is_empty());
    }
}
