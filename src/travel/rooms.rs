//! Lodging rooms and the per-tournament occupancy board.

use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};

use crate::{
    schema::rooms,
    tournaments::Tournament,
    travel::CoachTravel,
};

#[derive(
    Queryable, Selectable, Insertable, Serialize, Deserialize, Clone, Debug,
)]
#[diesel(table_name = rooms)]
#[diesel(check_for_backend(Sqlite))]
pub struct Room {
    pub id: String,
    pub tournament_id: String,
    pub room_number: String,
    pub hotel: String,
    pub room_type: String,
    pub cost_per_night: f64,
    pub nights: i64,
    /// JSON array of coach travel ids.
    pub occupants: String,
}

impl Room {
    pub fn occupant_ids(&self) -> Vec<String> {
        serde_json::from_str(&self.occupants).unwrap_or_default()
    }

    pub fn encode_occupants(ids: &[String]) -> String {
        serde_json::to_string(ids).unwrap()
    }

    pub fn holds(&self, coach_id: &str) -> bool {
        self.occupant_ids().iter().any(|id| id == coach_id)
    }
}

#[derive(Clone, Debug)]
pub struct RoomGroup {
    pub room: Room,
    pub coaches: Vec<CoachTravel>,
}

#[derive(Clone, Debug)]
pub struct TournamentOccupancy {
    pub tournament: Tournament,
    /// Rooms with at least one travel-relevant occupant, ordered by room
    /// number (lexicographic), coaches within each sorted by name.
    pub room_groups: Vec<RoomGroup>,
    /// Relevant coaches in no room with `no_roommate_needed` unset.
    pub unassigned: Vec<CoachTravel>,
    /// Relevant coaches flagged as not needing a roommate.
    pub no_roommate: Vec<CoachTravel>,
    /// True iff there is at least one relevant coach and every relevant
    /// coach has `travel_complete` set.
    pub all_complete: bool,
}

/// Builds the occupancy board for one tournament from its travel rows and
/// rooms. Only travel-relevant coaches (booked or confirmed) are considered.
pub fn resolve_occupancy(
    tournament: &Tournament,
    travels: &[CoachTravel],
    tournament_rooms: &[Room],
) -> TournamentOccupancy {
    let mut relevant: Vec<CoachTravel> = travels
        .iter()
        .filter(|t| t.is_travel_relevant())
        .cloned()
        .collect();
    relevant.sort_by(|a, b| a.coach_name.cmp(&b.coach_name));

    let mut room_groups: Vec<RoomGroup> = tournament_rooms
        .iter()
        .filter_map(|room| {
            let coaches: Vec<CoachTravel> = relevant
                .iter()
                .filter(|c| room.holds(&c.id))
                .cloned()
                .collect();
            if coaches.is_empty() {
                None
            } else {
                Some(RoomGroup {
                    room: room.clone(),
                    coaches,
                })
            }
        })
        .collect();
    room_groups.sort_by(|a, b| a.room.room_number.cmp(&b.room.room_number));

    let roomed_ids: Vec<String> = room_groups
        .iter()
        .flat_map(|g| g.coaches.iter().map(|c| c.id.clone()))
        .collect();

    let unassigned: Vec<CoachTravel> = relevant
        .iter()
        .filter(|c| !c.no_roommate_needed && !roomed_ids.contains(&c.id))
        .cloned()
        .collect();

    let no_roommate: Vec<CoachTravel> = relevant
        .iter()
        .filter(|c| c.no_roommate_needed)
        .cloned()
        .collect();

    let all_complete =
        !relevant.is_empty() && relevant.iter().all(|c| c.travel_complete);

    TournamentOccupancy {
        tournament: tournament.clone(),
        room_groups,
        unassigned,
        no_roommate,
        all_complete,
    }
}

/// Splits the per-tournament boards into active and completed lists, each
/// ordered by start date ascending with undated tournaments last.
pub fn split_active_completed(
    mut boards: Vec<TournamentOccupancy>,
) -> (Vec<TournamentOccupancy>, Vec<TournamentOccupancy>) {
    boards.sort_by_key(|b| {
        (b.tournament.start_date.is_none(), b.tournament.start_date)
    });

    boards.into_iter().partition(|b| !b.all_complete)
}

/// Moves a coach into a room. The coach is first removed from whatever room
/// currently holds it (read-modify-write, last writer wins) and then added
/// to the target's occupant list with set semantics. The removal sweep is
/// scoped by the target room's own tournament, never by caller input.
pub fn assign_coach_to_room(
    coach_id: &str,
    room_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<()> {
    let target = rooms::table
        .filter(rooms::id.eq(room_id))
        .first::<Room>(&mut *conn)?;

    remove_coach_from_rooms(&target.tournament_id, coach_id, conn)?;

    let mut ids = target.occupant_ids();
    if !ids.iter().any(|id| id == coach_id) {
        ids.push(coach_id.to_string());
    }

    diesel::update(rooms::table.filter(rooms::id.eq(room_id)))
        .set(rooms::occupants.eq(Room::encode_occupants(&ids)))
        .execute(&mut *conn)?;

    Ok(())
}

/// Removes a coach id from every room of the tournament that lists it.
pub fn remove_coach_from_rooms(
    tournament_id: &str,
    coach_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<()> {
    let existing = rooms::table
        .filter(rooms::tournament_id.eq(tournament_id))
        .load::<Room>(&mut *conn)?;

    for room in existing {
        if room.holds(coach_id) {
            let ids: Vec<String> = room
                .occupant_ids()
                .into_iter()
                .filter(|id| id != coach_id)
                .collect();

            diesel::update(rooms::table.filter(rooms::id.eq(&room.id)))
                .set(rooms::occupants.eq(Room::encode_occupants(&ids)))
                .execute(&mut *conn)?;
        }
    }

    Ok(())
}

/// Creates one new room holding exactly the given coaches, unassigning each
/// from any room it previously occupied. Requires at least two coaches.
pub fn room_coaches_together(
    tournament: &Tournament,
    coach_ids: &[String],
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<Option<Room>> {
    if coach_ids.len() < 2 {
        return Ok(None);
    }

    let mut unique = Vec::new();
    for id in coach_ids {
        if !unique.contains(id) {
            unique.push(id.clone());
        }
    }

    for id in &unique {
        remove_coach_from_rooms(&tournament.id, id, conn)?;
    }

    let existing: i64 = rooms::table
        .filter(rooms::tournament_id.eq(&tournament.id))
        .count()
        .get_result(&mut *conn)?;

    let room = Room {
        id: uuid::Uuid::now_v7().to_string(),
        tournament_id: tournament.id.clone(),
        room_number: format!("Room {}", existing + 1),
        hotel: tournament
            .housing_partner
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| "TBD".to_string()),
        room_type: "Double".to_string(),
        cost_per_night: 0.0,
        nights: 1,
        occupants: Room::encode_occupants(&unique),
    };

    diesel::insert_into(rooms::table)
        .values(&room)
        .execute(&mut *conn)?;

    Ok(Some(room))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use super::*;

    fn tournament(name: &str, start: Option<&str>) -> Tournament {
        Tournament {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            league_id: None,
            round_name: None,
            age_division_focus: None,
            gender_focus: "Boys".to_string(),
            location: None,
            start_date: start
                .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()),
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

    fn coach(name: &str, relevant: bool, complete: bool) -> CoachTravel {
        CoachTravel {
            id: Uuid::now_v7().to_string(),
            tournament_id: None,
            team_id: None,
            coach_name: name.to_string(),
            gender: None,
            preferred_airport: None,
            flight_booked: relevant,
            hotel_booked: false,
            travel_complete: complete,
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

    fn room(number: &str, occupant_ids: &[&str]) -> Room {
        Room {
            id: Uuid::now_v7().to_string(),
            tournament_id: "t".to_string(),
            room_number: number.to_string(),
            hotel: "Hampton".to_string(),
            room_type: "Double".to_string(),
            cost_per_night: 120.0,
            nights: 2,
            occupants: Room::encode_occupants(
                &occupant_ids
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>(),
            ),
        }
    }

    #[test]
    fn partitions_roomed_unassigned_and_no_roommate() {
        let t = tournament("Cup", None);
        let roomed = coach("Ann", true, false);
        let mut solo = coach("Bea", true, false);
        solo.no_roommate_needed = true;
        let floating = coach("Cal", true, false);
        let irrelevant = coach("Dee", false, false);

        let r = room("101", &[&roomed.id]);

        let board = resolve_occupancy(
            &t,
            &[
                roomed.clone(),
                solo.clone(),
                floating.clone(),
                irrelevant.clone(),
            ],
            &[r],
        );

        assert_eq!(board.room_groups.len(), 1);
        assert_eq!(board.room_groups[0].coaches[0].coach_name, "Ann");
        assert_eq!(board.unassigned.len(), 1);
        assert_eq!(board.unassigned[0].coach_name, "Cal");
        assert_eq!(board.no_roommate.len(), 1);
        assert_eq!(board.no_roommate[0].coach_name, "Bea");
    }

    #[test]
    fn rooms_without_relevant_occupants_are_dropped() {
        let t = tournament("Cup", None);
        let c = coach("Ann", true, false);
        let empty = room("102", &["missing-id"]);
        let held = room("101", &[&c.id]);

        let board = resolve_occupancy(&t, &[c], &[empty, held]);

        assert_eq!(board.room_groups.len(), 1);
        assert_eq!(board.room_groups[0].room.room_number, "101");
    }

    #[test]
    fn room_groups_sorted_by_room_number() {
        let t = tournament("Cup", None);
        let a = coach("Ann", true, false);
        let b = coach("Bea", true, false);

        let r2 = room("202", &[&b.id]);
        let r1 = room("101", &[&a.id]);

        let board = resolve_occupancy(&t, &[a, b], &[r2, r1]);

        let numbers: Vec<_> = board
            .room_groups
            .iter()
            .map(|g| g.room.room_number.clone())
            .collect();
        assert_eq!(numbers, vec!["101", "202"]);
    }

    #[test]
    fn completion_requires_at_least_one_relevant_coach() {
        let t = tournament("Cup", None);

        let board = resolve_occupancy(&t, &[], &[]);
        assert!(!board.all_complete);

        let board = resolve_occupancy(
            &t,
            &[coach("Ann", true, true), coach("Bea", true, true)],
            &[],
        );
        assert!(board.all_complete);

        let board = resolve_occupancy(
            &t,
            &[coach("Ann", true, true), coach("Bea", true, false)],
            &[],
        );
        assert!(!board.all_complete);
    }

    #[test]
    fn active_completed_split_sorts_by_start_date_missing_last() {
        let done = resolve_occupancy(
            &tournament("Done", Some("2026-05-01")),
            &[coach("Ann", true, true)],
            &[],
        );

        let boards = vec![
            resolve_occupancy(&tournament("Undated", None), &[], &[]),
            resolve_occupancy(
                &tournament("June", Some("2026-06-01")),
                &[],
                &[],
            ),
            done,
            resolve_occupancy(&tournament("May", Some("2026-05-02")), &[], &[]),
        ];

        let (active, completed) = split_active_completed(boards);

        let names: Vec<_> = active
            .iter()
            .map(|b| b.tournament.name.clone())
            .collect();
        assert_eq!(names, vec!["May", "June", "Undated"]);
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].tournament.name, "Done");
    }

    /// The removal sweep must cover every sibling room of the target room's
    /// tournament, whatever the caller thinks the tournament is.
    #[test]
    fn assignment_sweeps_the_target_rooms_own_tournament() {
        use diesel_migrations::MigrationHarness;

        use crate::schema::{coach_travels, tournaments};

        let mut conn = SqliteConnection::establish(":memory:").unwrap();
        conn.run_pending_migrations(crate::MIGRATIONS).unwrap();

        let tid = Uuid::now_v7().to_string();
        diesel::insert_into(tournaments::table)
            .values((
                tournaments::id.eq(&tid),
                tournaments::name.eq("Roomed Open"),
                tournaments::gender_focus.eq("Girls"),
                tournaments::status.eq("Not Started"),
                tournaments::created_at.eq(Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .unwrap();

        let coach_id = Uuid::now_v7().to_string();
        diesel::insert_into(coach_travels::table)
            .values((
                coach_travels::id.eq(&coach_id),
                coach_travels::tournament_id.eq(&tid),
                coach_travels::coach_name.eq("Sam Ortiz"),
                coach_travels::attendance_confirmed.eq(true),
            ))
            .execute(&mut conn)
            .unwrap();

        let mut make_room = |number: &str, occupants: &str| {
            let id = Uuid::now_v7().to_string();
            diesel::insert_into(rooms::table)
                .values((
                    rooms::id.eq(&id),
                    rooms::tournament_id.eq(&tid),
                    rooms::room_number.eq(number),
                    rooms::hotel.eq("Hilton"),
                    rooms::room_type.eq("Double"),
                    rooms::occupants.eq(occupants),
                ))
                .execute(&mut conn)
                .unwrap();
            id
        };
        let room_a =
            make_room("Room 1", &Room::encode_occupants(&[coach_id.clone()]));
        let room_b = make_room("Room 2", "[]");

        assign_coach_to_room(&coach_id, &room_b, &mut conn).unwrap();

        let all = rooms::table.load::<Room>(&mut conn).unwrap();
        let holding: Vec<&Room> =
            all.iter().filter(|r| r.holds(&coach_id)).collect();
        assert_eq!(holding.len(), 1);
        assert_eq!(holding[0].id, room_b);
        assert!(!all.iter().find(|r| r.id == room_a).unwrap().holds(&coach_id));
    }
}
