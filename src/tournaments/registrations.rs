use axum::{extract::Path, response::Redirect};
use axum_extra::extract::Form;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use hypertext::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::User,
    schema::{coach_travels, tournament_teams},
    state::Conn,
    teams::Team,
    tournaments::Tournament,
    travel::CoachTravel,
    util_resp::{
        FailureResponse, StandardResponse, bad_request, see_other_ok,
    },
    widgets::alert::ErrorAlert,
};

pub const REGISTRATION_STATUSES: &[&str] =
    &["Registered", "Waitlisted", "Paid", "Confirmed"];

#[derive(
    Queryable, Selectable, Insertable, Serialize, Deserialize, Clone, Debug,
)]
#[diesel(table_name = tournament_teams)]
#[diesel(check_for_backend(Sqlite))]
pub struct TournamentTeam {
    pub id: String,
    pub tournament_id: String,
    pub team_id: String,
    pub age_division_playing: Option<String>,
    pub team_location: Option<String>,
    pub roster_url: Option<String>,
    pub registration_status: String,
    pub notes: Option<String>,
}

impl TournamentTeam {
    pub fn fetch(
        registration_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<TournamentTeam, FailureResponse> {
        tournament_teams::table
            .filter(tournament_teams::id.eq(registration_id))
            .first::<TournamentTeam>(&mut *conn)
            .optional()
            .map_err(FailureResponse::from)?
            .ok_or(FailureResponse::NotFound(()))
    }
}

#[derive(Deserialize)]
pub struct RegisterTeamForm {
    team_id: String,
    #[serde(default)]
    age_division_playing: Option<String>,
}

/// Registering a team also seeds a fresh travel row per known coach, so the
/// travel board shows who needs flights and rooms the moment the team is on
/// the schedule. Names, gender and airport carry over; every tracking field
/// starts from zero.
pub async fn do_register_team(
    Path(tournament_id): Path<String>,
    _user: User<true>,
    mut conn: Conn<true>,
    Form(form): Form<RegisterTeamForm>,
) -> StandardResponse {
    let tournament = Tournament::fetch(&tournament_id, &mut *conn)?;
    let team = Team::fetch(&form.team_id, &mut *conn)?;

    let already = tournament_teams::table
        .filter(tournament_teams::tournament_id.eq(&tournament.id))
        .filter(tournament_teams::team_id.eq(&team.id))
        .count()
        .get_result::<i64>(&mut *conn)
        .map_err(FailureResponse::from)?;
    if already > 0 {
        return bad_request(
            maud! {
                ErrorAlert msg =
                    (format!("{} is already registered for this tournament.", team.name));
            }
            .render(),
        );
    }

    diesel::insert_into(tournament_teams::table)
        .values(&TournamentTeam {
            id: Uuid::now_v7().to_string(),
            tournament_id: tournament.id.clone(),
            team_id: team.id.clone(),
            age_division_playing: form
                .age_division_playing
                .filter(|d| !d.trim().is_empty()),
            team_location: team.club_location.clone(),
            roster_url: None,
            registration_status: "Registered".to_string(),
            notes: None,
        })
        .execute(&mut *conn)
        .map_err(FailureResponse::from)?;

    copy_forward_coaches(&tournament, &team, &mut *conn)?;

    see_other_ok(Redirect::to(&format!("/tournaments/{}", tournament.id)))
}

/// One new CoachTravel per coach already known for this team, keyed by the
/// latest row per (case-insensitive) name. Skips coaches who already have a
/// row for this tournament + team.
fn copy_forward_coaches(
    tournament: &Tournament,
    team: &Team,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<(), FailureResponse> {
    let prior = coach_travels::table
        .filter(coach_travels::team_id.eq(&team.id))
        .order(coach_travels::id.desc())
        .load::<CoachTravel>(&mut *conn)
        .map_err(FailureResponse::from)?;

    let mut seen: Vec<String> = Vec::new();
    for old in &prior {
        let key = old.coach_name.trim().to_lowercase();
        if key.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key.clone());

        let existing = prior.iter().any(|t| {
            t.tournament_id.as_deref() == Some(tournament.id.as_str())
                && t.coach_name.trim().to_lowercase() == key
        });
        if existing {
            continue;
        }

        diesel::insert_into(coach_travels::table)
            .values(&CoachTravel {
                id: Uuid::now_v7().to_string(),
                tournament_id: Some(tournament.id.clone()),
                team_id: Some(team.id.clone()),
                coach_name: old.coach_name.clone(),
                gender: old.gender.clone(),
                preferred_airport: old.preferred_airport.clone(),
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
            })
            .execute(&mut *conn)
            .map_err(FailureResponse::from)?;
    }

    Ok(())
}

#[derive(Deserialize)]
pub struct RegistrationStatusForm {
    registration_status: String,
}

pub async fn do_update_registration_status(
    Path((tournament_id, registration_id)): Path<(String, String)>,
    _user: User<true>,
    mut conn: Conn<true>,
    Form(form): Form<RegistrationStatusForm>,
) -> StandardResponse {
    let registration = TournamentTeam::fetch(&registration_id, &mut *conn)?;
    if registration.tournament_id != tournament_id {
        return Err(FailureResponse::NotFound(()));
    }
    if !REGISTRATION_STATUSES
        .contains(&form.registration_status.as_str())
    {
        return bad_request(
            maud! { ErrorAlert msg = "Unknown registration status."; }
                .render(),
        );
    }

    diesel::update(
        tournament_teams::table
            .filter(tournament_teams::id.eq(&registration.id)),
    )
    .set(
        tournament_teams::registration_status.eq(&form.registration_status),
    )
    .execute(&mut *conn)
    .map_err(FailureResponse::from)?;

    see_other_ok(Redirect::to(&format!("/tournaments/{tournament_id}")))
}

pub async fn do_remove_registration(
    Path((tournament_id, registration_id)): Path<(String, String)>,
    _user: User<true>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let registration = TournamentTeam::fetch(&registration_id, &mut *conn)?;
    if registration.tournament_id != tournament_id {
        return Err(FailureResponse::NotFound(()));
    }

    diesel::delete(
        tournament_teams::table
            .filter(tournament_teams::id.eq(&registration.id)),
    )
    .execute(&mut *conn)
    .map_err(FailureResponse::from)?;

    see_other_ok(Redirect::to(&format!("/tournaments/{tournament_id}")))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use diesel::prelude::*;
    use diesel_migrations::MigrationHarness;
    use uuid::Uuid;

    use crate::{
        MIGRATIONS,
        schema::{coach_travels, teams, tournaments},
        travel::CoachTravel,
    };

    fn conn() -> SqliteConnection {
        let mut conn = SqliteConnection::establish(":memory:").unwrap();
        conn.run_pending_migrations(MIGRATIONS).unwrap();
        conn
    }

    fn seed_tournament(conn: &mut SqliteConnection, name: &str) -> String {
        let id = Uuid::now_v7().to_string();
        diesel::insert_into(tournaments::table)
            .values((
                tournaments::id.eq(&id),
                tournaments::name.eq(name),
                tournaments::gender_focus.eq("Girls"),
                tournaments::status.eq("Not Started"),
                tournaments::created_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)
            .unwrap();
        id
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

    fn seed_travel(
        conn: &mut SqliteConnection,
        tournament_id: Option<&str>,
        team_id: &str,
        coach: &str,
    ) {
        diesel::insert_into(coach_travels::table)
            .values(&CoachTravel {
                id: Uuid::now_v7().to_string(),
                tournament_id: tournament_id.map(|t| t.to_string()),
                team_id: Some(team_id.to_string()),
                coach_name: coach.to_string(),
                gender: Some("Female".to_string()),
                preferred_airport: Some("DEN".to_string()),
                flight_booked: true,
                hotel_booked: true,
                travel_complete: true,
                attendance_confirmed: true,
                flight_confirmation: Some("ABC123".to_string()),
                hotel_confirmation: None,
                flight_cost: 412.0,
                hotel_cost: 300.0,
                rooming_notes: None,
                notes: None,
                no_roommate_needed: false,
            })
            .execute(conn)
            .unwrap();
    }

    #[test]
    fn copy_forward_resets_tracking_fields() {
        let mut conn = conn();
        let old_t = seed_tournament(&mut conn, "Spring Cup");
        let new_t = seed_tournament(&mut conn, "Summer Cup");
        let team = seed_team(&mut conn, "Vipers 12U");
        seed_travel(&mut conn, Some(old_t.as_str()), &team, "Sam Ortiz");

        let tournament =
            crate::tournaments::Tournament::fetch(&new_t, &mut conn).unwrap();
        let team = crate::teams::Team::fetch(&team, &mut conn).unwrap();
        super::copy_forward_coaches(&tournament, &team, &mut conn).unwrap();

        let copied = coach_travels::table
            .filter(coach_travels::tournament_id.eq(&new_t))
            .load::<CoachTravel>(&mut conn)
            .unwrap();
        assert_eq!(copied.len(), 1);
        let copied = &copied[0];
        assert_eq!(copied.coach_name, "Sam Ortiz");
        assert_eq!(copied.gender.as_deref(), Some("Female"));
        assert_eq!(copied.preferred_airport.as_deref(), Some("DEN"));
        assert!(!copied.flight_booked);
        assert!(!copied.travel_complete);
        assert_eq!(copied.flight_cost, 0.0);
        assert!(copied.flight_confirmation.is_none());
    }

    #[test]
    fn copy_forward_dedupes_coach_names() {
        let mut conn = conn();
        let old_t = seed_tournament(&mut conn, "Spring Cup");
        let other_t = seed_tournament(&mut conn, "Fall Cup");
        let new_t = seed_tournament(&mut conn, "Summer Cup");
        let team = seed_team(&mut conn, "Vipers 12U");
        seed_travel(&mut conn, Some(old_t.as_str()), &team, "Sam Ortiz");
        seed_travel(&mut conn, Some(other_t.as_str()), &team, "sam ortiz");

        let tournament =
            crate::tournaments::Tournament::fetch(&new_t, &mut conn).unwrap();
        let team = crate::teams::Team::fetch(&team, &mut conn).unwrap();
        super::copy_forward_coaches(&tournament, &team, &mut conn).unwrap();

        let copied = coach_travels::table
            .filter(coach_travels::tournament_id.eq(&new_t))
            .count()
            .get_result::<i64>(&mut conn)
            .unwrap();
        assert_eq!(copied, 1);
    }
}
