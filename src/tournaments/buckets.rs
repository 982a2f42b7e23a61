//! Sorting and date-bucketing of the tournament calendar.
//!
//! League-owned tournaments (those with a `league_id`) are shown on their
//! league's page instead, so every function here operates on the league-less
//! remainder only.

use chrono::{Datelike, Months, NaiveDate};
use indexmap::IndexMap;

use crate::tournaments::{GENDER_BOYS, GENDER_GIRLS, Tournament};

pub const NO_AGE_DIVISION: &str = "No Age Division";

#[derive(Debug, Default)]
pub struct TournamentBuckets {
    pub upcoming: Vec<Tournament>,
    pub this_month: Vec<Tournament>,
    pub past: Vec<Tournament>,
    pub boys_by_age: IndexMap<String, Vec<Tournament>>,
    pub girls_by_age: IndexMap<String, Vec<Tournament>>,
}

/// Partitions the league-less tournaments into upcoming / this-month / past,
/// and groups them by age division for each of the Boys and Girls focuses
/// (Mixed tournaments appear in neither map).
///
/// Per tournament the precedence is: Complete goes to past, then a start date
/// inside the current calendar month goes to this-month (even if the date has
/// already passed), then today-or-future goes to upcoming, and everything
/// else to past. A tournament with no start date is upcoming unless Complete.
/// A Complete tournament dated this month therefore lands in past, not
/// this-month.
pub fn bucket_tournaments(
    tournaments: &[Tournament],
    today: NaiveDate,
) -> TournamentBuckets {
    let month_start = today.with_day(1).unwrap();
    let month_end = month_start
        .checked_add_months(Months::new(1))
        .unwrap()
        .pred_opt()
        .unwrap();

    let mut buckets = TournamentBuckets::default();

    for tournament in tournaments {
        if tournament.league_id.is_some() {
            continue;
        }

        match tournament.start_date {
            None => {
                if tournament.is_complete() {
                    buckets.past.push(tournament.clone());
                } else {
                    buckets.upcoming.push(tournament.clone());
                }
            }
            Some(date) => {
                if tournament.is_complete() {
                    buckets.past.push(tournament.clone());
                } else if (month_start..=month_end).contains(&date) {
                    buckets.this_month.push(tournament.clone());
                } else if date >= today {
                    buckets.upcoming.push(tournament.clone());
                } else {
                    buckets.past.push(tournament.clone());
                }
            }
        }

        let division = tournament
            .age_division_focus
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| NO_AGE_DIVISION.to_string());

        if tournament.gender_focus == GENDER_BOYS {
            buckets
                .boys_by_age
                .entry(division)
                .or_default()
                .push(tournament.clone());
        } else if tournament.gender_focus == GENDER_GIRLS {
            buckets
                .girls_by_age
                .entry(division)
                .or_default()
                .push(tournament.clone());
        }
    }

    buckets
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SortOrder {
    DateAsc,
    DateDesc,
    NameAsc,
    NameDesc,
    Status,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<SortOrder> {
        match s {
            "date-asc" => Some(SortOrder::DateAsc),
            "date-desc" => Some(SortOrder::DateDesc),
            "name-asc" => Some(SortOrder::NameAsc),
            "name-desc" => Some(SortOrder::NameDesc),
            "status" => Some(SortOrder::Status),
            _ => None,
        }
    }
}

/// Flat sort used by the tournament list view. Tournaments without a start
/// date go last under date-asc and first under date-desc.
pub fn sort_tournaments(tournaments: &mut [Tournament], order: SortOrder) {
    match order {
        SortOrder::DateAsc => tournaments
            .sort_by_key(|t| (t.start_date.is_none(), t.start_date)),
        SortOrder::DateDesc => tournaments.sort_by(|a, b| {
            match (a.start_date, b.start_date) {
                (None, None) => std::cmp::Ordering::Equal,
                (None, Some(_)) => std::cmp::Ordering::Less,
                (Some(_), None) => std::cmp::Ordering::Greater,
                (Some(x), Some(y)) => y.cmp(&x),
            }
        }),
        SortOrder::NameAsc => tournaments
            .sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase())),
        SortOrder::NameDesc => tournaments
            .sort_by(|a, b| b.name.to_lowercase().cmp(&a.name.to_lowercase())),
        SortOrder::Status => tournaments.sort_by_key(|t| t.status_rank()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::tournaments::{
        GENDER_MIXED, STATUS_COMPLETE, STATUS_IN_PROGRESS, STATUS_NOT_STARTED,
    };

    fn tournament(
        name: &str,
        start: Option<&str>,
        status: &str,
        gender: &str,
        division: Option<&str>,
        league: Option<&str>,
    ) -> Tournament {
        Tournament {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            league_id: league.map(|l| l.to_string()),
            round_name: None,
            age_division_focus: division.map(|d| d.to_string()),
            gender_focus: gender.to_string(),
            location: None,
            start_date: start
                .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()),
            end_date: None,
            date_tentative: false,
            status: status.to_string(),
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

    fn today() -> NaiveDate {
        NaiveDate::parse_from_str("2026-06-15", "%Y-%m-%d").unwrap()
    }

    #[test]
    fn buckets_partition_leagueless_tournaments() {
        let tournaments = vec![
            tournament("A", Some("2026-06-20"), STATUS_NOT_STARTED, GENDER_BOYS, Some("12U"), None),
            tournament("B", Some("2026-07-04"), STATUS_NOT_STARTED, GENDER_GIRLS, None, None),
            tournament("C", Some("2026-03-01"), STATUS_NOT_STARTED, GENDER_MIXED, None, None),
            tournament("D", None, STATUS_NOT_STARTED, GENDER_BOYS, Some("10U"), None),
            tournament("E", None, STATUS_COMPLETE, GENDER_GIRLS, None, None),
            tournament("F", Some("2026-06-01"), STATUS_COMPLETE, GENDER_BOYS, Some("12U"), None),
            tournament("League", Some("2026-06-20"), STATUS_NOT_STARTED, GENDER_BOYS, None, Some("l1")),
        ];

        let buckets = bucket_tournaments(&tournaments, today());

        let leagueless = tournaments
            .iter()
            .filter(|t| t.league_id.is_none())
            .count();
        assert_eq!(
            buckets.upcoming.len()
                + buckets.this_month.len()
                + buckets.past.len(),
            leagueless
        );

        let names = |list: &[Tournament]| {
            list.iter().map(|t| t.name.clone()).collect::<Vec<_>>()
        };
        assert_eq!(names(&buckets.this_month), vec!["A"]);
        assert_eq!(names(&buckets.upcoming), vec!["B", "D"]);
        assert_eq!(names(&buckets.past), vec!["C", "E", "F"]);
    }

    #[test]
    fn complete_tournament_this_month_goes_to_past() {
        let tournaments = vec![tournament(
            "Done",
            Some("2026-06-20"),
            STATUS_COMPLETE,
            GENDER_BOYS,
            None,
            None,
        )];

        let buckets = bucket_tournaments(&tournaments, today());

        assert!(buckets.this_month.is_empty());
        assert_eq!(buckets.past.len(), 1);
    }

    #[test]
    fn earlier_date_in_current_month_is_this_month() {
        // The month window check comes before the today-or-future check, so
        // June 2nd still counts as this-month on June 15th.
        let tournaments = vec![tournament(
            "Early June",
            Some("2026-06-02"),
            STATUS_IN_PROGRESS,
            GENDER_BOYS,
            None,
            None,
        )];

        let buckets = bucket_tournaments(&tournaments, today());

        assert_eq!(buckets.this_month.len(), 1);
        assert!(buckets.past.is_empty());
    }

    #[test]
    fn gender_grouping_excludes_mixed_and_defaults_division() {
        let tournaments = vec![
            tournament("A", None, STATUS_NOT_STARTED, GENDER_BOYS, Some("12U"), None),
            tournament("B", None, STATUS_NOT_STARTED, GENDER_BOYS, Some("12U"), None),
            tournament("C", None, STATUS_NOT_STARTED, GENDER_GIRLS, None, None),
            tournament("D", None, STATUS_NOT_STARTED, GENDER_MIXED, Some("12U"), None),
        ];

        let buckets = bucket_tournaments(&tournaments, today());

        assert_eq!(buckets.boys_by_age.get("12U").unwrap().len(), 2);
        assert_eq!(
            buckets.girls_by_age.get(NO_AGE_DIVISION).unwrap().len(),
            1
        );
        let in_either: usize = buckets
            .boys_by_age
            .values()
            .chain(buckets.girls_by_age.values())
            .map(|v| v.len())
            .sum();
        assert_eq!(in_either, 3);
    }

    #[test]
    fn date_sorts_put_missing_dates_at_opposite_ends() {
        let mut list = vec![
            tournament("A", Some("2026-07-01"), STATUS_NOT_STARTED, GENDER_BOYS, None, None),
            tournament("B", None, STATUS_NOT_STARTED, GENDER_BOYS, None, None),
            tournament("C", Some("2026-05-01"), STATUS_NOT_STARTED, GENDER_BOYS, None, None),
        ];

        sort_tournaments(&mut list, SortOrder::DateAsc);
        assert_eq!(list.last().unwrap().name, "B");
        assert_eq!(list[0].name, "C");

        sort_tournaments(&mut list, SortOrder::DateDesc);
        assert_eq!(list[0].name, "B");
        assert_eq!(list[1].name, "A");
    }

    #[test]
    fn status_sort_ranks_fixed_order() {
        let mut list = vec![
            tournament("A", None, STATUS_COMPLETE, GENDER_BOYS, None, None),
            tournament("B", None, STATUS_NOT_STARTED, GENDER_BOYS, None, None),
            tournament("C", None, STATUS_IN_PROGRESS, GENDER_BOYS, None, None),
        ];

        sort_tournaments(&mut list, SortOrder::Status);
        let names: Vec<_> = list.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["B", "C", "A"]);
    }
}
