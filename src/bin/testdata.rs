//! Seeds a database with a representative season so the UI has something to
//! show during development.

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use diesel::{Connection, prelude::*};
use diesel_migrations::MigrationHarness;
use touchline::{
    MIGRATIONS,
    schema::{
        coach_travels, leagues, teams, tournament_teams, tournaments, users,
    },
};
use uuid::Uuid;

#[derive(Parser)]
pub struct Seed {
    database_url: Option<String>,
    /// Also seed coach travel rows with booked flights and hotels.
    #[clap(long, short, action)]
    travel: bool,
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn main() {
    let args = Seed::parse();
    let db_url = if let Some(url) = args.database_url {
        url
    } else {
        std::env::var("DATABASE_URL").expect(
            "please either set `DATABASE_URL` or pass the `--database-url` flag",
        )
    };

    let mut conn = diesel::SqliteConnection::establish(&db_url).unwrap();
    conn.run_pending_migrations(MIGRATIONS).unwrap();

    if users::table
        .filter(users::username.eq("admin"))
        .count()
        .get_result::<i64>(&mut conn)
        .unwrap()
        == 0
    {
        diesel::insert_into(users::table)
            .values((
                users::id.eq(Uuid::now_v7().to_string()),
                users::email.eq("admin@example.com"),
                users::username.eq("admin"),
                users::password_hash.eq({
                    let salt = SaltString::generate(&mut OsRng);
                    Argon2::default()
                        .hash_password("password".as_bytes(), &salt)
                        .unwrap()
                        .to_string()
                }),
                users::created_at.eq(Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .unwrap();
    }

    if tournaments::table
        .filter(tournaments::name.eq("Desert Showdown"))
        .count()
        .get_result::<i64>(&mut conn)
        .unwrap()
        > 0
    {
        panic!("seed data already present!")
    }

    let league_id = Uuid::now_v7().to_string();
    diesel::insert_into(leagues::table)
        .values((
            leagues::id.eq(&league_id),
            leagues::name.eq("Mountain League"),
            leagues::age_divisions
                .eq(serde_json::to_string(&["12U", "13U", "14U"]).unwrap()),
            leagues::rounds.eq(serde_json::to_string(&[
                "Round 1", "Round 2", "Finals",
            ])
            .unwrap()),
            leagues::created_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)
        .unwrap();

    let mut tournament = |name: &str,
                          gender: &str,
                          division: Option<&str>,
                          start: Option<&str>,
                          status: &str,
                          league: Option<&str>,
                          round: Option<&str>| {
        let id = Uuid::now_v7().to_string();
        diesel::insert_into(tournaments::table)
            .values((
                tournaments::id.eq(&id),
                tournaments::name.eq(name),
                tournaments::league_id.eq(league),
                tournaments::round_name.eq(round),
                tournaments::age_division_focus.eq(division),
                tournaments::gender_focus.eq(gender),
                tournaments::location.eq("Phoenix, AZ"),
                tournaments::start_date.eq(start.map(date)),
                tournaments::end_date
                    .eq(start.map(|s| date(s) + chrono::Days::new(2))),
                tournaments::status.eq(status),
                tournaments::housing_partner.eq("Stay & Play Co"),
                tournaments::preferred_airport.eq("PHX"),
                tournaments::created_at.eq(Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .unwrap();
        id
    };

    let showdown = tournament(
        "Desert Showdown",
        "Girls",
        Some("12U"),
        Some("2026-11-07"),
        "Not Started",
        None,
        None,
    );
    let classic = tournament(
        "Winter Classic",
        "Boys",
        Some("14U"),
        Some("2026-12-05"),
        "Not Started",
        None,
        None,
    );
    tournament(
        "Spring Cup",
        "Mixed",
        None,
        Some("2026-04-10"),
        "Complete",
        None,
        None,
    );
    tournament(
        "League Opener",
        "Girls",
        Some("12U"),
        Some("2026-09-12"),
        "Not Started",
        Some(league_id.as_str()),
        Some("Round 1"),
    );

    let mut team = |name: &str, organization: &str, location: &str| {
        let id = Uuid::now_v7().to_string();
        diesel::insert_into(teams::table)
            .values((
                teams::id.eq(&id),
                teams::name.eq(name),
                teams::organization.eq(organization),
                teams::club_location.eq(location),
                teams::created_at.eq(Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .unwrap();
        id
    };

    let vipers = team("Vipers 12U", "Academy Girls", "North");
    let cobras = team("Cobras 14U", "Academy Boys", "West");
    team("Rattlers 10U", "Other", "North");

    for (tournament_id, team_id, division) in [
        (&showdown, &vipers, "12U"),
        (&classic, &cobras, "14U"),
    ] {
        diesel::insert_into(tournament_teams::table)
            .values((
                tournament_teams::id.eq(Uuid::now_v7().to_string()),
                tournament_teams::tournament_id.eq(tournament_id),
                tournament_teams::team_id.eq(team_id),
                tournament_teams::age_division_playing.eq(division),
                tournament_teams::registration_status.eq("Registered"),
            ))
            .execute(&mut conn)
            .unwrap();
    }

    if args.travel {
        let coaches = [
            ("Sam Ortiz", &showdown, &vipers, true, 412.50, "DEN"),
            ("Lee Park", &showdown, &vipers, false, 0.0, "DEN"),
            ("Dana Reyes", &classic, &cobras, true, 287.00, "PHX"),
        ];
        for (name, tournament_id, team_id, booked, cost, airport) in coaches {
            diesel::insert_into(coach_travels::table)
                .values((
                    coach_travels::id.eq(Uuid::now_v7().to_string()),
                    coach_travels::tournament_id.eq(tournament_id.as_str()),
                    coach_travels::team_id.eq(team_id.as_str()),
                    coach_travels::coach_name.eq(name),
                    coach_travels::preferred_airport.eq(airport),
                    coach_travels::flight_booked.eq(booked),
                    coach_travels::flight_cost.eq(cost),
                    coach_travels::attendance_confirmed.eq(true),
                ))
                .execute(&mut conn)
                .unwrap();
        }
    }

    println!("seeded {db_url}");
}
