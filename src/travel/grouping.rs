//! Collapses per-tournament/per-team travel rows into one group per coach.

use std::collections::HashMap;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::{teams::Team, tournaments::Tournament, travel::CoachTravel};

#[derive(Clone, Debug)]
pub struct CoachGroup {
    pub name: String,
    /// Every team the coach has at least one travel row under, deduplicated.
    pub teams: Vec<Team>,
    /// Every tournament likewise.
    pub tournaments: Vec<Tournament>,
    /// All raw rows for this coach name.
    pub records: Vec<CoachTravel>,
    /// First nonempty value seen across the rows, in input order.
    pub notes: String,
    pub gender: String,
    pub preferred_airport: String,
}

/// Groups travel rows by their exact `coach_name`. Two rows whose names
/// differ only in case or whitespace are two different coaches; that is the
/// stored identity rule, not something to paper over here.
///
/// Output is ordered alphabetically by name. Empty inputs give an empty
/// output.
pub fn group_coaches(
    travels: &[CoachTravel],
    teams: &[Team],
    tournaments: &[Tournament],
) -> Vec<CoachGroup> {
    let teams_by_id: HashMap<&str, &Team> =
        teams.iter().map(|t| (t.id.as_str(), t)).collect();
    let tournaments_by_id: HashMap<&str, &Tournament> =
        tournaments.iter().map(|t| (t.id.as_str(), t)).collect();

    let mut groups: IndexMap<String, CoachGroup> = IndexMap::new();

    for record in travels {
        let group = groups
            .entry(record.coach_name.clone())
            .or_insert_with(|| CoachGroup {
                name: record.coach_name.clone(),
                teams: vec![],
                tournaments: vec![],
                records: vec![],
                notes: String::new(),
                gender: String::new(),
                preferred_airport: String::new(),
            });

        if let Some(team) = record
            .team_id
            .as_deref()
            .and_then(|id| teams_by_id.get(id))
        {
            if !group.teams.iter().any(|t| t.id == team.id) {
                group.teams.push((*team).clone());
            }
        }

        if let Some(tournament) = record
            .tournament_id
            .as_deref()
            .and_then(|id| tournaments_by_id.get(id))
        {
            if !group.tournaments.iter().any(|t| t.id == tournament.id) {
                group.tournaments.push((*tournament).clone());
            }
        }

        if group.notes.is_empty() {
            if let Some(notes) = record.notes.as_deref() {
                if !notes.is_empty() {
                    group.notes = notes.to_string();
                }
            }
        }
        if group.gender.is_empty() {
            if let Some(gender) = record.gender.as_deref() {
                if !gender.is_empty() {
                    group.gender = gender.to_string();
                }
            }
        }
        if group.preferred_airport.is_empty() {
            if let Some(airport) = record.preferred_airport.as_deref() {
                if !airport.is_empty() {
                    group.preferred_airport = airport.to_string();
                }
            }
        }

        group.records.push(record.clone());
    }

    groups
        .into_values()
        .sorted_by(|a, b| a.name.cmp(&b.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn team(name: &str) -> Team {
        Team {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            organization: "Other".to_string(),
            club_location: None,
            home_city: None,
            notes: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    fn tournament(name: &str) -> Tournament {
        Tournament {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            league_id: None,
            round_name: None,
            age_division_focus: None,
            gender_focus: "Boys".to_string(),
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

    fn travel(
        coach: &str,
        team: Option<&Team>,
        tournament: Option<&Tournament>,
    ) -> CoachTravel {
        CoachTravel {
            id: Uuid::now_v7().to_string(),
            tournament_id: tournament.map(|t| t.id.clone()),
            team_id: team.map(|t| t.id.clone()),
            coach_name: coach.to_string(),
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

    #[test]
    fn one_group_per_exact_name_with_deduplicated_refs() {
        let team_a = team("A");
        let team_b = team("B");
        let cup = tournament("Cup");

        let travels = vec![
            travel("Jane Doe", Some(&team_a), Some(&cup)),
            travel("Jane Doe", Some(&team_a), Some(&cup)),
            travel("Jane Doe", Some(&team_b), None),
        ];

        let groups = group_coaches(
            &travels,
            &[team_a.clone(), team_b.clone()],
            &[cup.clone()],
        );

        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.records.len(), 3);
        assert_eq!(group.teams.len(), 2);
        assert_eq!(group.tournaments.len(), 1);
    }

    #[test]
    fn name_match_is_case_and_whitespace_sensitive() {
        let travels = vec![
            travel("Jane Doe", None, None),
            travel("jane doe", None, None),
            travel("Jane Doe ", None, None),
        ];

        let groups = group_coaches(&travels, &[], &[]);

        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn groups_are_sorted_by_name() {
        let travels = vec![
            travel("Zoe", None, None),
            travel("Amir", None, None),
            travel("Mira", None, None),
        ];

        let groups = group_coaches(&travels, &[], &[]);

        let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Amir", "Mira", "Zoe"]);
    }

    #[test]
    fn first_nonempty_merge_fields_win() {
        let mut first = travel("Jane Doe", None, None);
        first.preferred_airport = Some(String::new());
        let mut second = travel("Jane Doe", None, None);
        second.preferred_airport = Some("DFW".to_string());
        second.notes = Some("prefers aisle".to_string());
        let mut third = travel("Jane Doe", None, None);
        third.preferred_airport = Some("ORD".to_string());

        let groups = group_coaches(&[first, second, third], &[], &[]);

        assert_eq!(groups[0].preferred_airport, "DFW");
        assert_eq!(groups[0].notes, "prefers aisle");
    }

    #[test]
    fn empty_inputs_give_empty_output() {
        assert!(group_coaches(&[], &[], &[]).is_empty());
    }
}
