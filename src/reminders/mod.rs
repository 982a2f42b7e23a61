use axum::{extract::Path, response::Redirect};
use axum_extra::extract::Form;
use chrono::{NaiveDateTime, Utc};
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use hypertext::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::User,
    schema::action_reminders,
    state::Conn,
    tournaments::create::parse_date,
    util_resp::{
        FailureResponse, StandardResponse, bad_request, see_other_ok,
    },
    widgets::alert::ErrorAlert,
};

#[derive(
    Queryable, Selectable, Insertable, Serialize, Deserialize, Clone, Debug,
)]
#[diesel(table_name = action_reminders)]
#[diesel(check_for_backend(Sqlite))]
pub struct ActionReminder {
    pub id: String,
    pub tournament_id: Option<String>,
    pub title: String,
    pub due_date: Option<chrono::NaiveDate>,
    pub complete: bool,
    pub created_at: NaiveDateTime,
}

impl ActionReminder {
    pub fn fetch(
        reminder_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<ActionReminder, FailureResponse> {
        action_reminders::table
            .filter(action_reminders::id.eq(reminder_id))
            .first::<ActionReminder>(&mut *conn)
            .optional()
            .map_err(FailureResponse::from)?
            .ok_or(FailureResponse::NotFound(()))
    }
}

#[derive(Deserialize)]
pub struct CreateReminderForm {
    title: String,
    #[serde(default)]
    tournament_id: Option<String>,
    #[serde(default)]
    due_date: Option<String>,
}

pub async fn do_create_reminder(
    _user: User<true>,
    mut conn: Conn<true>,
    Form(form): Form<CreateReminderForm>,
) -> StandardResponse {
    if form.title.trim().is_empty() {
        return bad_request(
            maud! { ErrorAlert msg = "Reminder title is required."; }
                .render(),
        );
    }

    let tournament_id = form.tournament_id.filter(|t| !t.is_empty());
    let redirect = tournament_id
        .as_deref()
        .map(|t| format!("/tournaments/{t}"))
        .unwrap_or_else(|| "/".to_string());

    diesel::insert_into(action_reminders::table)
        .values(&ActionReminder {
            id: Uuid::now_v7().to_string(),
            tournament_id,
            title: form.title.trim().to_string(),
            due_date: parse_date(&form.due_date)?,
            complete: false,
            created_at: Utc::now().naive_utc(),
        })
        .execute(&mut *conn)
        .map_err(FailureResponse::from)?;

    see_other_ok(Redirect::to(&redirect))
}

fn reminder_redirect(reminder: &ActionReminder) -> String {
    reminder
        .tournament_id
        .as_deref()
        .map(|t| format!("/tournaments/{t}"))
        .unwrap_or_else(|| "/".to_string())
}

pub async fn do_complete_reminder(
    Path(reminder_id): Path<String>,
    _user: User<true>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let reminder = ActionReminder::fetch(&reminder_id, &mut *conn)?;

    diesel::update(
        action_reminders::table
            .filter(action_reminders::id.eq(&reminder.id)),
    )
    .set(action_reminders::complete.eq(true))
    .execute(&mut *conn)
    .map_err(FailureResponse::from)?;

    see_other_ok(Redirect::to(&reminder_redirect(&reminder)))
}

pub async fn do_delete_reminder(
    Path(reminder_id): Path<String>,
    _user: User<true>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let reminder = ActionReminder::fetch(&reminder_id, &mut *conn)?;

    diesel::delete(
        action_reminders::table
            .filter(action_reminders::id.eq(&reminder.id)),
    )
    .execute(&mut *conn)
    .map_err(FailureResponse::from)?;

    see_other_ok(Redirect::to(&reminder_redirect(&reminder)))
}
