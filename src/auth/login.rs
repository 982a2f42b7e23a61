use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
    Form,
    extract::Query,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use diesel::prelude::*;
use hypertext::prelude::*;
use serde::Deserialize;
use url::Url;

use crate::{
    auth::{User, set_login_cookie},
    schema::users,
    state::Conn,
    template::Page,
    util_resp::{StandardResponse, success},
    widgets::alert::ErrorAlert,
};

pub async fn login_page(user: Option<User<false>>) -> StandardResponse {
    if user.is_some() {
        return success(
            Page::new()
                .user_opt(user)
                .body(maud! {
                    ErrorAlert
                        msg = "You are already logged in, so cannot log in!";
                })
                .render(),
        );
    }

    success(Page::new().user_opt(user).body(maud! {
        h1 { "Login" }
        form method="post" class="mt-4" {
            div class="mb-3" {
                label for="id" class="form-label" { "Email or username" }
                input type="text" class="form-control" id="id" name="id" required;
            }
            div class="mb-3" {
                label for="password" class="form-label" { "Password" }
                input type="password" class="form-control" id="password" name="password" required;
            }
            button type="submit" class="btn btn-primary" { "Submit" }
        }
    }).render())
}

#[derive(Deserialize)]
pub struct LoginForm {
    id: String,
    password: String,
}

#[derive(Deserialize)]
pub struct NextParam {
    next: Option<String>,
}

pub async fn do_login(
    user: Option<User<false>>,
    Query(params): Query<NextParam>,
    jar: PrivateCookieJar,
    mut conn: Conn<false>,
    Form(form): Form<LoginForm>,
) -> Response {
    let found = users::table
        .filter(users::email.eq(&form.id).or(users::username.eq(&form.id)))
        .first::<User<false>>(&mut *conn)
        .optional()
        .unwrap();

    let found = match found {
        Some(found) => found,
        None => {
            return Html(
                Page::new()
                    .user_opt(user)
                    .body(maud! {
                        ErrorAlert
                            msg = "No such user exists. Please return to the
                                   previous page and try again.";
                    })
                    .render()
                    .into_inner(),
            )
            .into_response();
        }
    };

    let parsed_hash = PasswordHash::new(&found.password_hash).unwrap();
    if Argon2::default()
        .verify_password(form.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        // todo: password rate limiting
        return Html(
            Page::new()
                .user_opt(user)
                .body(maud! {
                    ErrorAlert msg =
                        "Incorrect password. Please return to the previous
                         page and try again.";
                })
                .render()
                .into_inner(),
        )
        .into_response();
    }

    let jar = set_login_cookie(found.id, jar);

    let redirect_to = if let Some(url) = params
        .next
        .as_deref()
        .and_then(|url| url.parse::<Url>().ok())
    {
        url.path().to_string()
    } else {
        "/".to_string()
    };

    (jar, Redirect::to(&redirect_to)).into_response()
}
