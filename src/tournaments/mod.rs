use chrono::{NaiveDate, NaiveDateTime};
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};

use crate::{schema::tournaments, util_resp::FailureResponse};

pub mod buckets;
pub mod create;
pub mod manage;
pub mod registrations;
pub mod view;

pub const STATUS_NOT_STARTED: &str = "Not Started";
pub const STATUS_IN_PROGRESS: &str = "In Progress";
pub const STATUS_COMPLETE: &str = "Complete";

pub const GENDER_BOYS: &str = "Boys";
pub const GENDER_GIRLS: &str = "Girls";
pub const GENDER_MIXED: &str = "Mixed";

#[derive(
    Queryable, Selectable, Insertable, Serialize, Deserialize, Clone, Debug,
)]
#[diesel(table_name = tournaments)]
#[diesel(check_for_backend(Sqlite))]
pub struct Tournament {
    pub id: String,
    pub name: String,
    pub league_id: Option<String>,
    pub round_name: Option<String>,
    pub age_division_focus: Option<String>,
    pub gender_focus: String,
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub date_tentative: bool,
    pub status: String,
    pub housing_required: bool,
    pub stay_play_required: bool,
    pub housing_partner: Option<String>,
    pub housing_opens_date: Option<NaiveDate>,
    pub housing_email_sent: bool,
    pub housing_notes: Option<String>,
    pub contact_info: Option<String>,
    pub stay_play_requirements: Option<String>,
    pub club_location: Option<String>,
    pub league_home_alert_complete: bool,
    pub preferred_airport: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Tournament {
    #[tracing::instrument(skip(conn))]
    pub fn fetch(
        tournament_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Tournament, FailureResponse> {
        tournaments::table
            .filter(tournaments::id.eq(tournament_id))
            .first::<Tournament>(&mut *conn)
            .optional()
            .map_err(FailureResponse::from)?
            .ok_or(FailureResponse::NotFound(()))
    }

    pub fn is_complete(&self) -> bool {
        self.status == STATUS_COMPLETE
    }

    /// Fixed ordering used by the status sort: Not Started < In Progress <
    /// Complete; anything unrecognised sorts after all of these.
    pub fn status_rank(&self) -> u8 {
        match self.status.as_str() {
            STATUS_NOT_STARTED => 0,
            STATUS_IN_PROGRESS => 1,
            STATUS_COMPLETE => 2,
            _ => 3,
        }
    }
}
