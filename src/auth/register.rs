use argon2::Argon2;
use argon2::PasswordHasher;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use axum::{
    Form,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use chrono::Utc;
use diesel::{insert_into, prelude::*};
use hypertext::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use crate::validation::*;
use crate::{
    auth::{User, set_login_cookie},
    schema::users,
    state::Conn,
    template::Page,
    util_resp::{StandardResponse, bad_request, success},
    widgets::alert::ErrorAlert,
};

pub async fn register_page(user: Option<User<false>>) -> StandardResponse {
    if user.is_some() {
        // todo: flash message
        return success(
            Page::new()
                .user_opt(user)
                .body(maud! {
                    ErrorAlert msg = "You already have an account.";
                })
                .render(),
        );
    }

    success(
        Page::<_, false>::new()
            .body(maud! {
                h1 { "Register" }
                form method="post" class="mt-4" {
                    div class="mb-3" {
                        label for="username" class="form-label" { "Username" }
                        input type="text" class="form-control" id="username" name="username";
                    }
                    div class="mb-3" {
                        label for="email" class="form-label" { "Email" }
                        input type="email" class="form-control" id="email" name="email";
                    }
                    div class="mb-3" {
                        label for="password" class="form-label" { "Password" }
                        input type="password" class="form-control" id="password" name="password";
                    }
                    div class="mb-3" {
                        label for="password2" class="form-label" { "Confirm Password" }
                        input type="password" class="form-control" id="password2" name="password2";
                    }
                    button type="submit" class="btn btn-primary" { "Register" }
                }
            })
            .render(),
    )
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

pub async fn do_register(
    user: Option<User<false>>,
    jar: PrivateCookieJar,
    mut conn: Conn<false>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, Response> {
    if user.is_some() {
        // todo: flash message
        return Ok(Redirect::to("/").into_response());
    }

    let render_err = |msg: String| {
        bad_request(
            Page::<_, false>::new()
                .body(maud! {
                    ErrorAlert msg = (&msg);
                })
                .render(),
        )
        .unwrap_err()
        .into_response()
    };

    if let Err(e) = is_ascii_no_spaces(&form.username) {
        return Err(render_err(format!("Invalid username: {e}")));
    }
    if let Err(e) = is_valid_email(&form.email) {
        return Err(render_err(e));
    }
    if form.password.len() < 6 {
        return Err(render_err(
            "Password must be at least 6 characters.".to_string(),
        ));
    }
    if form.password != form.password2 {
        return Err(render_err("Passwords do not match.".to_string()));
    }

    let taken = users::table
        .filter(
            users::username
                .eq(&form.username)
                .or(users::email.eq(&form.email)),
        )
        .count()
        .get_result::<i64>(&mut *conn)
        .unwrap()
        > 0;
    if taken {
        return Err(render_err(
            "That username or email is already in use.".to_string(),
        ));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(form.password.as_bytes(), &salt)
        .unwrap()
        .to_string();

    let uid = Uuid::now_v7().to_string();

    insert_into(users::table)
        .values((
            users::id.eq(&uid),
            users::email.eq(&form.email),
            users::username.eq(&form.username),
            users::password_hash.eq(&password_hash),
            users::created_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut *conn)
        .unwrap();

    let jar = set_login_cookie(uid, jar);

    Ok((jar, Redirect::to("/")).into_response())
}
