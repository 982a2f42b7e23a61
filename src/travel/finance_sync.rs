//! Keeps coach flight/hotel spend mirrored into the tournament ledger.
//!
//! A travel row's cost is linked to its transaction by tournament, category,
//! and a substring match on the coach's name in the description. There is no
//! foreign key; the name match is the only link.

use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};

use crate::{
    finance::{CATEGORY_FLIGHT, CATEGORY_HOTEL, FinanceTransaction},
    schema::finance_transactions,
    travel::CoachTravel,
};

/// Reconciles both cost categories of a travel row after it has been
/// updated. A booked flag with a positive cost upserts the matching
/// transaction; anything else deletes it.
pub fn sync_travel_costs(
    travel: &CoachTravel,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<()> {
    sync_category(
        travel,
        CATEGORY_FLIGHT,
        travel.flight_booked,
        travel.flight_cost,
        travel.flight_confirmation.as_deref(),
        conn,
    )?;
    sync_category(
        travel,
        CATEGORY_HOTEL,
        travel.hotel_booked,
        travel.hotel_cost,
        travel.hotel_confirmation.as_deref(),
        conn,
    )
}

fn sync_category(
    travel: &CoachTravel,
    category: &str,
    booked: bool,
    cost: f64,
    confirmation: Option<&str>,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<()> {
    // Team-level rows with no tournament have no ledger to write into.
    let tournament_id = match travel.tournament_id.as_deref() {
        Some(id) => id,
        None => return Ok(()),
    };

    let existing = finance_transactions::table
        .filter(
            finance_transactions::tournament_id
                .eq(tournament_id)
                .and(finance_transactions::category.eq(category))
                .and(
                    finance_transactions::description
                        .like(format!("%{}%", travel.coach_name)),
                ),
        )
        .first::<FinanceTransaction>(&mut *conn)
        .optional()?;

    if booked && cost > 0.0 {
        match existing {
            Some(txn) => {
                diesel::update(
                    finance_transactions::table
                        .filter(finance_transactions::id.eq(&txn.id)),
                )
                .set((
                    finance_transactions::amount.eq(cost),
                    finance_transactions::notes
                        .eq(confirmation.map(|c| c.to_string())),
                ))
                .execute(&mut *conn)?;
            }
            None => {
                let txn = FinanceTransaction {
                    id: uuid::Uuid::now_v7().to_string(),
                    tournament_id: tournament_id.to_string(),
                    team_id: travel.team_id.clone(),
                    category: category.to_string(),
                    description: format!(
                        "{category} for {}",
                        travel.coach_name
                    ),
                    amount: cost,
                    date: chrono::Utc::now().date_naive(),
                    notes: confirmation.map(|c| c.to_string()),
                };

                diesel::insert_into(finance_transactions::table)
                    .values(&txn)
                    .execute(&mut *conn)?;
            }
        }
    } else if let Some(txn) = existing {
        diesel::delete(
            finance_transactions::table
                .filter(finance_transactions::id.eq(&txn.id)),
        )
        .execute(&mut *conn)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use diesel::{Connection, SqliteConnection};
    use diesel_migrations::MigrationHarness;
    use uuid::Uuid;

    use super::*;
    use crate::{
        MIGRATIONS,
        schema::{coach_travels, tournaments},
    };

    fn setup() -> (SqliteConnection, String) {
        let mut conn = SqliteConnection::establish(":memory:").unwrap();
        conn.run_pending_migrations(MIGRATIONS).unwrap();

        let tid = Uuid::now_v7().to_string();
        diesel::insert_into(tournaments::table)
            .values((
                tournaments::id.eq(&tid),
                tournaments::name.eq("Spring Cup"),
                tournaments::gender_focus.eq("Boys"),
                tournaments::status.eq("Not Started"),
                tournaments::created_at.eq(Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .unwrap();

        (conn, tid)
    }

    fn travel_row(tid: &str, name: &str) -> CoachTravel {
        CoachTravel {
            id: Uuid::now_v7().to_string(),
            tournament_id: Some(tid.to_string()),
            team_id: None,
            coach_name: name.to_string(),
            gender: None,
            preferred_airport: None,
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
        }
    }

    fn all_transactions(
        conn: &mut SqliteConnection,
    ) -> Vec<FinanceTransaction> {
        finance_transactions::table
            .load::<FinanceTransaction>(conn)
            .unwrap()
    }

    #[test]
    fn booking_a_flight_creates_one_transaction() {
        let (mut conn, tid) = setup();

        let mut travel = travel_row(&tid, "Jane Doe");
        diesel::insert_into(coach_travels::table)
            .values(&travel)
            .execute(&mut conn)
            .unwrap();

        travel.flight_booked = true;
        travel.flight_cost = 250.0;
        travel.flight_confirmation = Some("ABC123".to_string());
        sync_travel_costs(&travel, &mut conn).unwrap();

        let txns = all_transactions(&mut conn);
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].category, "Flight");
        assert_eq!(txns[0].amount, 250.0);
        assert!(txns[0].description.contains("Jane Doe"));
        assert_eq!(txns[0].notes.as_deref(), Some("ABC123"));
    }

    #[test]
    fn unbooking_deletes_the_matching_transaction() {
        let (mut conn, tid) = setup();

        let mut travel = travel_row(&tid, "Jane Doe");
        travel.flight_booked = true;
        travel.flight_cost = 250.0;
        sync_travel_costs(&travel, &mut conn).unwrap();
        assert_eq!(all_transactions(&mut conn).len(), 1);

        travel.flight_booked = false;
        sync_travel_costs(&travel, &mut conn).unwrap();
        assert!(all_transactions(&mut conn).is_empty());
    }

    #[test]
    fn resyncing_updates_rather_than_duplicates() {
        let (mut conn, tid) = setup();

        let mut travel = travel_row(&tid, "Jane Doe");
        travel.hotel_booked = true;
        travel.hotel_cost = 300.0;
        sync_travel_costs(&travel, &mut conn).unwrap();

        travel.hotel_cost = 450.0;
        sync_travel_costs(&travel, &mut conn).unwrap();

        let txns = all_transactions(&mut conn);
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].category, "Hotel");
        assert_eq!(txns[0].amount, 450.0);
    }

    #[test]
    fn zero_cost_booking_creates_nothing() {
        let (mut conn, tid) = setup();

        let mut travel = travel_row(&tid, "Jane Doe");
        travel.flight_booked = true;
        travel.flight_cost = 0.0;
        sync_travel_costs(&travel, &mut conn).unwrap();

        assert!(all_transactions(&mut conn).is_empty());
    }
}
