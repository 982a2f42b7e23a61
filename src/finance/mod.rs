use axum::{Form, extract::Path, response::Redirect};
use chrono::NaiveDate;
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use hypertext::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    auth::User,
    schema::finance_transactions,
    state::Conn,
    template::Page,
    tournaments::Tournament,
    util_resp::{FailureResponse, StandardResponse, see_other_ok, success},
};

pub const CATEGORY_HOTEL: &str = "Hotel";
pub const CATEGORY_FLIGHT: &str = "Flight";
pub const CATEGORY_MEALS: &str = "Meals";
pub const CATEGORY_MISC: &str = "Misc";

pub const CATEGORIES: &[&str] =
    &[CATEGORY_HOTEL, CATEGORY_FLIGHT, CATEGORY_MEALS, CATEGORY_MISC];

#[derive(
    Queryable, Selectable, Insertable, Serialize, Deserialize, Clone, Debug,
)]
#[diesel(table_name = finance_transactions)]
#[diesel(check_for_backend(Sqlite))]
pub struct FinanceTransaction {
    pub id: String,
    pub tournament_id: String,
    pub team_id: Option<String>,
    pub category: String,
    pub description: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

pub fn transactions_for_tournament(
    tournament_id: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> QueryResult<Vec<FinanceTransaction>> {
    finance_transactions::table
        .filter(finance_transactions::tournament_id.eq(tournament_id))
        .order_by(finance_transactions::date.desc())
        .load::<FinanceTransaction>(&mut *conn)
}

pub async fn tournament_finance_page(
    Path(tid): Path<String>,
    user: User<true>,
    mut conn: Conn<true>,
) -> StandardResponse {
    let tournament = Tournament::fetch(&tid, &mut *conn)?;
    let transactions = transactions_for_tournament(&tid, &mut *conn)
        .map_err(FailureResponse::from)?;

    let total: f64 = transactions.iter().map(|t| t.amount).sum();
    let by_category: Vec<(&str, f64)> = CATEGORIES
        .iter()
        .map(|cat| {
            (
                *cat,
                transactions
                    .iter()
                    .filter(|t| t.category == *cat)
                    .map(|t| t.amount)
                    .sum(),
            )
        })
        .collect();

    success(
        Page::new()
            .user(user)
            .tournament(tournament.clone())
            .active_nav("tournaments")
            .body(maud! {
                h1 { "Finance: " (tournament.name) }

                div class="row mb-4" {
                    @for (category, subtotal) in &by_category {
                        div class="col-md-3" {
                            div class="card" {
                                div class="card-body" {
                                    h6 class="card-subtitle text-muted" { (category) }
                                    p class="card-text fs-4" { (format!("${subtotal:.2}")) }
                                }
                            }
                        }
                    }
                }
                p class="lead" { "Total: " (format!("${total:.2}")) }

                div class="card mb-4" {
                    div class="card-body bg-light" {
                        form action=(format!("/tournaments/{}/finance/create", tournament.id)) method="post" class="row g-3 align-items-end" {
                            div class="col-md-2" {
                                label class="form-label" { "Category" }
                                select class="form-select" name="category" required {
                                    @for category in CATEGORIES {
                                        option value=(category) { (category) }
                                    }
                                }
                            }
                            div class="col-md-4" {
                                label class="form-label" { "Description" }
                                input type="text" class="form-control" name="description" required;
                            }
                            div class="col-md-2" {
                                label class="form-label" { "Amount" }
                                input type="number" step="0.01" class="form-control" name="amount" required;
                            }
                            div class="col-md-2" {
                                label class="form-label" { "Date" }
                                input type="date" class="form-control" name="date" required;
                            }
                            div class="col-md-2" {
                                button type="submit" class="btn btn-primary w-100" { "Add" }
                            }
                        }
                    }
                }

                div class="table-responsive border rounded" {
                    table class="table table-hover mb-0" {
                        thead class="bg-light" {
                            tr {
                                th { "Date" }
                                th { "Category" }
                                th { "Description" }
                                th { "Amount" }
                                th { "Notes" }
                                th class="text-end" { "Actions" }
                            }
                        }
                        tbody {
                            @for txn in &transactions {
                                tr {
                                    td { (txn.date.to_string()) }
                                    td { (txn.category) }
                                    td { (txn.description) }
                                    td { (format!("${:.2}", txn.amount)) }
                                    td { (txn.notes.as_deref().unwrap_or("")) }
                                    td class="text-end" {
                                        form action=(format!("/tournaments/{}/finance/{}/delete", tournament.id, txn.id)) method="post"
                                            onsubmit="return confirm('Delete this transaction?');" {
                                            button type="submit" class="btn btn-sm btn-link text-danger text-decoration-none" { "Delete" }
                                        }
                                    }
                                }
                            }
                            @if transactions.is_empty() {
                                tr {
                                    td colspan="6" class="text-center text-muted py-4" { "No transactions recorded." }
                                }
                            }
                        }
                    }
                }
            })
            .render(),
    )
}

#[derive(Deserialize)]
pub struct CreateTransactionForm {
    category: String,
    description: String,
    amount: f64,
    date: NaiveDate,
}

pub async fn create_transaction(
    Path(tid): Path<String>,
    _user: User<true>,
    mut conn: Conn<true>,
    Form(form): Form<CreateTransactionForm>,
) -> StandardResponse {
    let tournament = Tournament::fetch(&tid, &mut *conn)?;

    let txn = FinanceTransaction {
        id: uuid::Uuid::now_v7().to_string(),
        tournament_id: tournament.id.clone(),
        team_id: None,
        category: form.category,
        description: form.description,
        amount: form.amount,
        date: form.date,
        notes: None,
    };

    diesel::insert_into(finance_transactions::table)
        .values(&txn)
        .execute(&mut *conn)
        .map_err(FailureResponse::from)?;

    see_other_ok(Redirect::to(&format!("/tournaments/{tid}/finance")))
}

pub async fn delete_transaction(
    Path((tid, txn_id)): Path<(String, String)>,
    _user: User<true>,
    mut conn: Conn<true>,
) -> StandardResponse {
    Tournament::fetch(&tid, &mut *conn)?;

    diesel::delete(
        finance_transactions::table
            .filter(finance_transactions::id.eq(txn_id)),
    )
    .execute(&mut *conn)
    .map_err(FailureResponse::from)?;

    see_other_ok(Redirect::to(&format!("/tournaments/{tid}/finance")))
}
