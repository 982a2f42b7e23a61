use chrono::NaiveDateTime;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use serde::{Deserialize, Serialize};

use crate::{schema::teams, util_resp::FailureResponse};

pub mod manage;

pub const ORGANIZATIONS: &[&str] = &[
    "Academy Boys",
    "Academy Girls",
    "Academy Girls Elite",
    "Other",
];

pub const CLUB_LOCATIONS: &[&str] = &["North", "West"];

#[derive(
    Queryable, Selectable, Insertable, Serialize, Deserialize, Clone, Debug,
)]
#[diesel(table_name = teams)]
#[diesel(check_for_backend(Sqlite))]
pub struct Team {
    pub id: String,
    pub name: String,
    pub organization: String,
    pub club_location: Option<String>,
    pub home_city: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Team {
    #[tracing::instrument(skip(conn))]
    pub fn fetch(
        team_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Team, FailureResponse> {
        teams::table
            .filter(teams::id.eq(team_id))
            .first::<Team>(&mut *conn)
            .optional()
            .map_err(FailureResponse::from)?
            .ok_or(FailureResponse::NotFound(()))
    }

    /// Key used for duplicate detection: trimmed, case-folded name.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Groups teams whose normalized names collide. Only sets with two or more
/// members are returned; within a set teams keep their input order, so the
/// first member is the default merge survivor.
pub fn duplicate_sets(teams: &[Team]) -> Vec<Vec<Team>> {
    let mut by_name: indexmap::IndexMap<String, Vec<Team>> =
        indexmap::IndexMap::new();

    for team in teams {
        by_name
            .entry(team.normalized_name())
            .or_default()
            .push(team.clone());
    }

    by_name
        .into_values()
        .filter(|set| set.len() > 1)
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

    #[test]
    fn duplicate_sets_match_case_and_whitespace_insensitively() {
        let teams = vec![
            team("Vipers 12U"),
            team("  vipers 12u "),
            team("Cobras 10U"),
        ];

        let sets = duplicate_sets(&teams);

        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].len(), 2);
        assert_eq!(sets[0][0].name, "Vipers 12U");
    }

    #[test]
    fn unique_names_produce_no_sets() {
        let teams = vec![team("A"), team("B")];
        assert!(duplicate_sets(&teams).is_empty());
    }
}
