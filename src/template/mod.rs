//! Templating code.
//!
//! This defines the [`Page`] item, which is used in most of the other parts of
//! this crate.

use hypertext::prelude::*;

use crate::{auth::User, tournaments::Tournament};

const NAV_ITEMS: &[(&str, &str)] = &[
    ("tournaments", "/tournaments"),
    ("teams", "/teams"),
    ("travel", "/travel"),
    ("leagues", "/leagues"),
    ("imports", "/imports"),
];

pub struct Page<R1: Renderable, const TX: bool> {
    body: Option<R1>,
    user: Option<User<TX>>,
    tournament: Option<Tournament>,
    active_nav: Option<&'static str>,
}

impl<R1: Renderable, const TX: bool> Page<R1, TX> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn tournament(mut self, tournament: Tournament) -> Self {
        self.tournament = Some(tournament);
        self
    }

    pub fn body(mut self, body: R1) -> Self {
        self.body = Some(body);
        self
    }

    pub fn user(mut self, user: User<TX>) -> Self {
        self.user = Some(user);
        self
    }

    pub fn user_opt(mut self, user: Option<User<TX>>) -> Self {
        self.user = user;
        self
    }

    pub fn active_nav(mut self, item: &'static str) -> Self {
        self.active_nav = Some(item);
        self
    }
}

impl<R1: Renderable, const TX: bool> Renderable for Page<R1, TX> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            html {
                head {
                    title { "Touchline" }
                    script src="https://cdn.jsdelivr.net/npm/htmx.org@2.0.7/dist/htmx.min.js" integrity="sha384-ZBXiYtYQ6hJ2Y0ZNoYuI+Nq5MqWBr+chMrS/RkXpNzQCApHEhOt2aY8EJgqwHLkJ" crossorigin="anonymous" {
                    }
                    link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css" rel="stylesheet";
                    meta
                        name="viewport"
                        content="width=device-width, initial-scale=1";
                }
                body class="d-flex flex-column vh-100" {
                    nav class="navbar navbar-expand"
                        style="background-color: #1d4d2b;"
                        data-bs-theme="dark" {
                        div class="container-fluid" style="display: flex; justify-content: space-between; align-items: center;" {
                            @if let Some(tournament) = &self.tournament {
                                a class="navbar-brand text-white"
                                  href=(format!("/tournaments/{}", tournament.id)) {
                                    (tournament.name)
                                }
                            } @else {
                                a class="navbar-brand text-white" href="/" {
                                    "Touchline"
                                }
                            }
                            ul class="navbar-nav" style="display: flex; gap: 1rem;" data-bs-theme="dark" {
                                @for (name, href) in NAV_ITEMS {
                                    li class="nav-item" {
                                        @if self.active_nav == Some(*name) {
                                            a class="nav-link text-white fw-bold" href=(href) {
                                                (capitalized(name))
                                            }
                                        } @else {
                                            a class="nav-link text-white" href=(href) {
                                                (capitalized(name))
                                            }
                                        }
                                    }
                                }
                            }
                            div {
                                ul class="navbar-nav" style="display: flex; gap: 1rem;" data-bs-theme="dark" {
                                    @if let Some(user) = &self.user {
                                        li class="nav-item" {
                                            span class="nav-link text-white" {
                                                (user.username)
                                            }
                                        }
                                    } @else {
                                        li class="nav-item" {
                                            a class="nav-link text-white" href="/login" {
                                                "Login"
                                            }
                                        }
                                        li class="nav-item" {
                                            a class="nav-link text-white" href="/register" {
                                                "Register"
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                    div class="flex-grow-1" {
                        div class="container py-4" {
                            @if let Some(body) = &self.body {
                                (body)
                            }
                        }
                    }
                }
            }
        }
        .render_to(buffer)
    }
}

impl<R1: Renderable, const TX: bool> Default for Page<R1, TX> {
    fn default() -> Self {
        Self {
            body: Default::default(),
            user: Default::default(),
            tournament: Default::default(),
            active_nav: Default::default(),
        }
    }
}

fn capitalized(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
