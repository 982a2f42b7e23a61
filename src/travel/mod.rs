use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};

use crate::{schema::coach_travels, util_resp::FailureResponse};

pub mod board;
pub mod finance_sync;
pub mod grouping;
pub mod rooms;

/// One coach's involvement in one tournament/team context. There is no coach
/// entity: "the coach" is the set of rows sharing a `coach_name` string,
/// matched exactly as typed (case and whitespace significant).
#[derive(
    Queryable, Selectable, Insertable, Serialize, Deserialize, Clone, Debug,
)]
#[diesel(table_name = coach_travels)]
#[diesel(check_for_backend(Sqlite))]
pub struct CoachTravel {
    pub id: String,
    pub tournament_id: Option<String>,
    pub team_id: Option<String>,
    pub coach_name: String,
    pub gender: Option<String>,
    pub preferred_airport: Option<String>,
    pub flight_booked: bool,
    pub hotel_booked: bool,
    pub travel_complete: bool,
    pub attendance_confirmed: bool,
    pub flight_confirmation: Option<String>,
    pub hotel_confirmation: Option<String>,
    pub flight_cost: f64,
    pub hotel_cost: f64,
    pub rooming_notes: Option<String>,
    pub notes: Option<String>,
    pub no_roommate_needed: bool,
}

impl CoachTravel {
    #[tracing::instrument(skip(conn))]
    pub fn fetch(
        travel_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<CoachTravel, FailureResponse> {
        coach_travels::table
            .filter(coach_travels::id.eq(travel_id))
            .first::<CoachTravel>(&mut *conn)
            .optional()
            .map_err(FailureResponse::from)?
            .ok_or(FailureResponse::NotFound(()))
    }

    /// A coach counts for the travel board once any travel activity exists
    /// on the record.
    pub fn is_travel_relevant(&self) -> bool {
        self.flight_booked || self.hotel_booked || self.attendance_confirmed
    }
}
