use axum::extract::Multipart;
use chrono::{NaiveDate, Utc};
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use hypertext::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::User,
    imports::{ImportError, ImportSummary, read_upload, summary_page},
    schema::tournaments,
    state::Conn,
    teams::normalize_name,
    tournaments::{
        GENDER_BOYS, GENDER_GIRLS, GENDER_MIXED, STATUS_NOT_STARTED,
        Tournament,
    },
    util_resp::{StandardResponse, bad_request},
    widgets::alert::ErrorAlert,
};

#[derive(Debug, Deserialize)]
pub struct TournamentRow {
    pub tournament: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age_division: Option<String>,
}

pub fn parse_tournament_rows(
    bytes: &[u8],
) -> Result<Vec<TournamentRow>, ImportError> {
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

#[tracing::instrument(skip(rows, conn), fields(rows = rows.len()))]
pub fn import_tournaments(
    rows: &[TournamentRow],
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<ImportSummary, ImportError> {
    let mut summary = ImportSummary::default();
    let mut known = tournaments::table.load::<Tournament>(&mut *conn)?;

    for (i, row) in rows.iter().enumerate() {
        let line = i + 2;
        let key = normalize_name(&row.tournament);
        if key.is_empty() {
            continue;
        }

        let location = nonempty(&row.location);
        let start_date = parse_csv_date(&row.start_date, line)?;
        let end_date = parse_csv_date(&row.end_date, line)?;
        let gender = nonempty(&row.gender).filter(|g| {
            [GENDER_BOYS, GENDER_GIRLS, GENDER_MIXED]
                .contains(&g.as_str())
        });
        let age_division = nonempty(&row.age_division);

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
            if let Some(g) = &gender {
                if existing.gender_focus != *g {
                    existing.gender_focus = g.clone();
                    patched = true;
                }
            }
            if age_division.is_some()
                && existing.age_division_focus != age_division
            {
                existing.age_division_focus = age_division;
                patched = true;
            }
            if patched {
                diesel::update(
                    tournaments::table
                        .filter(tournaments::id.eq(&existing.id)),
                )
                .set((
                    tournaments::location.eq(&existing.location),
                    tournaments::start_date.eq(existing.start_date),
                    tournaments::end_date.eq(existing.end_date),
                    tournaments::gender_focus.eq(&existing.gender_focus),
                    tournaments::age_division_focus
                        .eq(&existing.age_division_focus),
                ))
                .execute(&mut *conn)?;
                summary.tournaments_patched += 1;
            }
            continue;
        }

        let tournament = Tournament {
            id: Uuid::now_v7().to_string(),
            name: row.tournament.trim().to_string(),
            league_id: None,
            round_name: None,
            age_division_focus: age_division,
            gender_focus: gender
                .unwrap_or_else(|| GENDER_MIXED.to_string()),
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
        known.push(tournament);
    }

    tracing::debug!(?summary, "tournament sheet reconciled");
    Ok(summary)
}

pub async fn do_import_tournaments(
    user: User<false>,
    mut conn: Conn<false>,
    mut multipart: Multipart,
) -> StandardResponse {
    let bytes = read_upload(&mut multipart).await?;

    let rows = match parse_tournament_rows(&bytes) {
        Ok(rows) => rows,
        Err(e) => {
            return bad_request(
                maud! { ErrorAlert msg = (&e); }.render(),
            );
        }
    };

    match import_tournaments(&rows, &mut *conn) {
        Ok(summary) => Ok(summary_page(user, &summary)),
        Err(e) => bad_request(maud! { ErrorAlert msg = (&e); }.render()),
    }
}
