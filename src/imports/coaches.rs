use axum::extract::Multipart;
use chrono::{NaiveDate, Utc};
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use hypertext::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::User,
    imports::{ImportError, ImportSummary, read_upload, summary_page},
    schema::{coach_travels, teams, tournaments},
    state::Conn,
    teams::{Team, normalize_name},
    tournaments::{GENDER_MIXED, STATUS_NOT_STARTED, Tournament},
    travel::CoachTravel,
    util_resp::{StandardResponse, bad_request},
    widgets::alert::ErrorAlert,
};

/// One line of a coach travel sheet. Only `tournament`, `team` and `coach`
/// are required; everything else is best-effort enrichment.
#[derive(Debug, Deserialize)]
pub struct CoachRow {
    pub tournament: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    pub team: String,
    pub coach: String,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub airport: Option<String>,
}

pub fn parse_coach_rows(bytes: &[u8]) -> Result<Vec<CoachRow>, ImportError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers = reader.headers()?.clone();
    reader
        .records()
        .map(|record| {
            Ok(record?
                .deserialize(Some(&headers))
                .map_err(ImportError::Csv)?)
        })
        .collect()
}

fn parse_csv_date(
    raw: &Option<String>,
    row: usize,
) -> Result<Option<NaiveDate>, ImportError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<NaiveDate>().map(Some).map_err(|_| {
            ImportError::BadDate {
                row,
                value: value.to_string(),
            }
        }),
    }
}

fn nonempty(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Reconciles a parsed sheet against the database. Rows are applied as they
/// are processed; an error partway through leaves earlier rows in place.
///
/// The in-memory snapshots double as a within-upload dedupe, so a sheet that
/// repeats a coach only creates them once.
#[tracing::instrument(skip(rows, conn), fields(rows = rows.len()))]
pub fn import_coaches(
    rows: &[CoachRow],
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<ImportSummary, ImportError> {
    let mut summary = ImportSummary::default();

    let mut known_tournaments =
        tournaments::table.load::<Tournament>(&mut *conn)?;
    let mut known_teams = teams::table.load::<Team>(&mut *conn)?;
    // (team_id, tournament_id, normalized coach name)
    let mut known_coaches: Vec<(Option<String>, Option<String>, String)> =
        coach_travels::table
            .load::<CoachTravel>(&mut *conn)?
            .into_iter()
            .map(|t| {
                let key = normalize_name(&t.coach_name);
                (t.team_id, t.tournament_id, key)
            })
            .collect();

    // data rows start on line 2, after the header
    for (i, row) in rows.iter().enumerate() {
        let line = i + 2;
        let tournament_id = reconcile_tournament(
            row,
            line,
            &mut known_tournaments,
            &mut summary,
            conn,
        )?;
        let team_id =
            reconcile_team(&row.team, &mut known_teams, &mut summary, conn)?;

        let coach_key = normalize_name(&row.coach);
        if coach_key.is_empty() {
            continue;
        }
        let duplicate = known_coaches.iter().any(|(team, tournament, key)| {
            team.as_deref() == Some(team_id.as_str())
                && tournament.as_deref() == Some(tournament_id.as_str())
                && *key == coach_key
        });
        if duplicate {
            summary.coaches_skipped += 1;
            continue;
        }

        diesel::insert_into(coach_travels::table)
            .values(&CoachTravel {
                id: Uuid::now_v7().to_string(),
                tournament_id: Some(tournament_id.clone()),
                team_id: Some(team_id.clone()),
                coach_name: row.coach.trim().to_string(),
                gender: nonempty(&row.gender),
                // a sheet cell that is not a three-letter code is dropped
                // rather than aborting the batch
                preferred_airport: nonempty(&row.airport)
                    .filter(|a| {
                        crate::validation::is_valid_airport_code(a).is_ok()
                    })
                    .map(|a| a.to_uppercase()),
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
            .execute(&mut *conn)?;
        known_coaches.push((
            Some(team_id),
            Some(tournament_id),
            coach_key,
        ));
        summary.coaches_created += 1;
    }

    tracing::debug!(?summary, "coach sheet reconciled");
    Ok(summary)
}

/// Matches on case-insensitive trimmed name. A hit is patched with whatever
/// nonempty fields the sheet carries; a miss becomes a bare tournament.
fn reconcile_tournament(
    row: &CoachRow,
    line: usize,
    known: &mut Vec<Tournament>,
    summary: &mut ImportSummary,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<String, ImportError> {
    let key = normalize_name(&row.tournament);
    let location = nonempty(&row.location);
    let start_date = parse_csv_date(&row.start_date, line)?;
    let end_date = parse_csv_date(&row.end_date, line)?;

    if let Some(existing) =
        known.iter_mut().find(|t| normalize_name(&t.name) == key)
    {
        let mut patched = false;
        if location.is_some() && existing.location != location {
            existing.location = location;
            patched = true;
        }
        if start_date.is_some() && existing.start_date != start_date {
            existing.start_date = start_date;
            patched = true;
        }
        if end_date.is_some() && existing.end_date != end_date {
            existing.end_date = end_date;
            patched = true;
        }
        if patched {
            diesel::update(
                tournaments::table.filter(tournaments::id.eq(&existing.id)),
            )
            .set((
                tournaments::location.eq(&existing.location),
                tournaments::start_date.eq(existing.start_date),
                tournaments::end_date.eq(existing.end_date),
            ))
            .execute(&mut *conn)?;
            summary.tournaments_patched += 1;
        }
        return Ok(existing.id.clone());
    }

    let tournament = Tournament {
        id: Uuid::now_v7().to_string(),
        name: row.tournament.trim().to_string(),
        league_id: None,
        round_name: None,
        age_division_focus: None,
        gender_focus: GENDER_MIXED.to_string(),
        location,
        start_date,
        end_date,
        date_tentative: false,
        status: STATUS_NOT_STARTED.to_string(),
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
    };
    diesel::insert_into(tournaments::table)
        .values(&tournament)
        .execute(&mut *conn)?;
    summary.tournaments_created += 1;
    let id = tournament.id.clone();
    known.push(tournament);
    Ok(id)
}

fn reconcile_team(
    name: &str,
    known: &mut Vec<Team>,
    summary: &mut ImportSummary,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<String, ImportError> {
    let key = normalize_name(name);
    if let Some(existing) =
        known.iter().find(|t| t.normalized_name() == key)
    {
        return Ok(existing.id.clone());
    }

    let team = Team {
        id: Uuid::now_v7().to_string(),
        name: name.trim().to_string(),
        organization: "Other".to_string(),
        club_location: None,
        home_city: None,
        notes: None,
        created_at: Utc::now().naive_utc(),
    };
    diesel::insert_into(teams::table)
        .values(&team)
        .execute(&mut *conn)?;
    summary.teams_created += 1;
    let id = team.id.clone();
    known.push(team);
    Ok(id)
}

/// Runs outside the per-request transaction: a sheet that fails on row 200
/// keeps its first 199 rows.
pub async fn do_import_coaches(
    user: User<false>,
    mut conn: Conn<false>,
    mut multipart: Multipart,
) -> StandardResponse {
    let bytes = read_upload(&mut multipart).await?;

    let rows = match parse_coach_rows(&bytes) {
        Ok(rows) => rows,
        Err(e) => {
            return bad_request(
                maud! { ErrorAlert msg = (&e); }.render(),
            );
        }
    };

    match import_coaches(&rows, &mut *conn) {
        Ok(summary) => Ok(summary_page(user, &summary)),
        Err(e) => bad_request(maud! { ErrorAlert msg = (&e); }.render()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use diesel::prelude::*;
    use diesel_migrations::MigrationHarness;
    use uuid::Uuid;

    use super::*;
    use crate::MIGRATIONS;

    fn conn() -> SqliteConnection {
        let mut conn = SqliteConnection::establish(":memory:").unwrap();
        conn.run_pending_migrations(MIGRATIONS).unwrap();
        conn
    }

    const SHEET: &str = "\
tournament,location,start_date,end_date,team,coach,gender,airport
Spring Cup,Denver,2026-04-10,2026-04-12,Vipers 12U,Sam Ortiz,Female,DEN
Spring Cup,Denver,2026-04-10,2026-04-12,Vipers 12U,Lee Park,,
Spring Cup,,,,Cobras 10U,Sam Ortiz,,
";

    #[test]
    fn first_upload_creates_everything_once() {
        let mut conn = conn();
        let rows = parse_coach_rows(SHEET.as_bytes()).unwrap();

        let summary = import_coaches(&rows, &mut conn).unwrap();

        assert_eq!(summary.tournaments_created, 1);
        assert_eq!(summary.teams_created, 2);
        assert_eq!(summary.coaches_created, 3);
        assert_eq!(summary.coaches_skipped, 0);

        let tournament_count: i64 =
            tournaments::table.count().get_result(&mut conn).unwrap();
        assert_eq!(tournament_count, 1);
    }

    #[test]
    fn second_upload_is_a_no_op() {
        let mut conn = conn();
        let rows = parse_coach_rows(SHEET.as_bytes()).unwrap();
        import_coaches(&rows, &mut conn).unwrap();

        let summary = import_coaches(&rows, &mut conn).unwrap();

        assert_eq!(summary.tournaments_created, 0);
        assert_eq!(summary.teams_created, 0);
        assert_eq!(summary.coaches_created, 0);
        assert_eq!(summary.coaches_skipped, 3);

        let coach_count: i64 =
            coach_travels::table.count().get_result(&mut conn).unwrap();
        assert_eq!(coach_count, 3);
    }

    #[test]
    fn malformed_airport_cells_are_dropped_not_fatal() {
        let mut conn = conn();
        let sheet = "\
tournament,location,start_date,end_date,team,coach,gender,airport
Spring Cup,,,,Vipers 12U,Sam Ortiz,,Dallas/Fort Worth
Spring Cup,,,,Vipers 12U,Lee Park,,den
";
        let rows = parse_coach_rows(sheet.as_bytes()).unwrap();

        let summary = import_coaches(&rows, &mut conn).unwrap();
        assert_eq!(summary.coaches_created, 2);

        let airports: Vec<Option<String>> = coach_travels::table
            .select(coach_travels::preferred_airport)
            .order(coach_travels::coach_name)
            .load(&mut conn)
            .unwrap();
        assert_eq!(airports, vec![Some("DEN".to_string()), None]);
    }

    #[test]
    fn nonempty_fields_overwrite_an_existing_tournament() {
        let mut conn = conn();
        diesel::insert_into(tournaments::table)
            .values((
                tournaments::id.eq(Uuid::now_v7().to_string()),
                tournaments::name.eq("spring cup"),
                tournaments::gender_focus.eq("Girls"),
                tournaments::status.eq("Not Started"),
                tournaments::created_at.eq(Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .unwrap();

        let rows = parse_coach_rows(SHEET.as_bytes()).unwrap();
        let summary = import_coaches(&rows, &mut conn).unwrap();

        assert_eq!(summary.tournaments_created, 0);
        assert_eq!(summary.tournaments_patched, 1);

        let location: Option<String> = tournaments::table
            .select(tournaments::location)
            .first(&mut conn)
            .unwrap();
        assert_eq!(location.as_deref(), Some("Denver"));
    }

    #[test]
    fn duplicate_rows_within_one_sheet_collapse() {
        let mut conn = conn();
        let sheet = "\
tournament,location,start_date,end_date,team,coach,gender,airport
Spring Cup,,,,Vipers 12U,Sam Ortiz,,
Spring Cup,,,,Vipers 12U,sam ortiz,,
";
        let rows = parse_coach_rows(sheet.as_bytes()).unwrap();

        let summary = import_coaches(&rows, &mut conn).unwrap();

        assert_eq!(summary.coaches_created, 1);
        assert_eq!(summary.coaches_skipped, 1);
    }

    #[test]
    fn bad_date_stops_the_batch_but_keeps_prior_rows() {
        let mut conn = conn();
        let sheet = "\
tournament,location,start_date,end_date,team,coach,gender,airport
Spring Cup,,,,Vipers 12U,Sam Ortiz,,
Fall Cup,,April 1st,,Vipers 12U,Lee Park,,
";
        let rows = parse_coach_rows(sheet.as_bytes()).unwrap();

        let err = import_coaches(&rows, &mut conn).unwrap_err();
        assert!(matches!(err, ImportError::BadDate { row: 3, .. }));

        let coach_count: i64 =
            coach_travels::table.count().get_result(&mut conn).unwrap();
        assert_eq!(coach_count, 1);
    }
}
