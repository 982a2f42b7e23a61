//! Touchline is a web application for coordinating a youth sports club's
//! tournament season: team registrations, coach travel and lodging, league
//! rounds, and the expenses that come out of all of the above.

use diesel_migrations::{EmbeddedMigrations, embed_migrations};

pub mod auth;
pub mod config;
pub mod finance;
pub mod imports;
pub mod leagues;
pub mod reminders;
pub mod schema;
pub mod state;
pub mod teams;
pub mod template;
pub mod tournaments;
pub mod travel;
pub mod util_resp;
pub mod validation;
pub mod widgets;

#[cfg(test)]
pub mod test;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
