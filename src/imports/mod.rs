//! Bulk CSV import. Each upload is reconciled row-by-row against what is
//! already in the database; rows that match existing records are skipped or
//! patched rather than duplicated, so re-uploading the same file is safe.

use axum::extract::Multipart;
use hypertext::prelude::*;

use crate::{
    auth::User,
    template::Page,
    util_resp::{FailureResponse, SuccessResponse},
    widgets::alert::{ErrorAlert, InfoAlert},
};

pub mod coaches;
pub mod tournaments;

/// What one upload did, shown back to the operator.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub tournaments_created: usize,
    pub tournaments_patched: usize,
    pub teams_created: usize,
    pub coaches_created: usize,
    pub coaches_skipped: usize,
}

#[derive(Debug)]
pub enum ImportError {
    Csv(csv::Error),
    BadDate { row: usize, value: String },
    Db(diesel::result::Error),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Csv(e) => write!(f, "could not parse CSV: {e}"),
            ImportError::BadDate { row, value } => {
                write!(
                    f,
                    "row {row}: unreadable date {value:?} (expected YYYY-MM-DD)"
                )
            }
            ImportError::Db(e) => write!(f, "database error: {e}"),
        }
    }
}

impl From<csv::Error> for ImportError {
    fn from(e: csv::Error) -> Self {
        ImportError::Csv(e)
    }
}

impl From<diesel::result::Error> for ImportError {
    fn from(e: diesel::result::Error) -> Self {
        ImportError::Db(e)
    }
}

pub async fn imports_page(user: User<false>) -> SuccessResponse {
    SuccessResponse::Success(
        Page::new()
            .user(user)
            .active_nav("imports")
            .body(maud! {
                h1 { "Imports" }
                p class="text-muted" {
                    "Upload a CSV and the importer reconciles it against "
                    "existing tournaments, teams and coaches. Nothing is "
                    "duplicated; uploading the same file twice is a no-op."
                }

                div class="row mt-4" {
                    div class="col-md-6" {
                        div class="card" {
                            div class="card-header" { "Coach travel sheet" }
                            div class="card-body" {
                                p class="small text-muted" {
                                    "Columns: tournament, location, start_date, "
                                    "end_date, team, coach, gender, airport. "
                                    "Only tournament, team and coach are required."
                                }
                                form action="/imports/coaches" method="post" enctype="multipart/form-data" {
                                    input class="form-control mb-2" type="file" name="file" accept=".csv" required;
                                    button type="submit" class="btn btn-primary" { "Import coaches" }
                                }
                            }
                        }
                    }
                    div class="col-md-6" {
                        div class="card" {
                            div class="card-header" { "Tournament list" }
                            div class="card-body" {
                                p class="small text-muted" {
                                    "Columns: tournament, location, start_date, "
                                    "end_date, gender, age_division. Existing "
                                    "tournaments are patched where the sheet has "
                                    "values; blanks never erase anything."
                                }
                                form action="/imports/tournaments" method="post" enctype="multipart/form-data" {
                                    input class="form-control mb-2" type="file" name="file" accept=".csv" required;
                                    button type="submit" class="btn btn-primary" { "Import tournaments" }
                                }
                            }
                        }
                    }
                }
            })
            .render(),
    )
}

/// Pulls the uploaded file out of the multipart body.
pub(crate) async fn read_upload(
    multipart: &mut Multipart,
) -> Result<Vec<u8>, FailureResponse> {
    while let Some(field) =
        multipart.next_field().await.map_err(|_| missing_file())?
    {
        if field.name() == Some("file") {
            return Ok(field
                .bytes()
                .await
                .map_err(|_| missing_file())?
                .to_vec());
        }
    }
    Err(missing_file())
}

fn missing_file() -> FailureResponse {
    FailureResponse::BadRequest(
        maud! { ErrorAlert msg = "The upload needs a CSV file field."; }
            .render(),
    )
}

pub(crate) fn summary_page(
    user: User<false>,
    summary: &ImportSummary,
) -> SuccessResponse {
    SuccessResponse::Success(
        Page::new()
            .user(user)
            .active_nav("imports")
            .body(maud! {
                h1 { "Import finished" }
                @if summary.tournaments_created == 0
                    && summary.teams_created == 0
                    && summary.coaches_created == 0
                {
                    InfoAlert msg = "Everything in the sheet matched existing records; nothing new was created.";
                }
                ul class="list-group my-3" {
                    li class="list-group-item" {
                        (summary.tournaments_created) " tournament(s) created, "
                        (summary.tournaments_patched) " updated"
                    }
                    li class="list-group-item" {
                        (summary.teams_created) " team(s) created"
                    }
                    li class="list-group-item" {
                        (summary.coaches_created) " coach travel record(s) created, "
                        (summary.coaches_skipped) " skipped as duplicates"
                    }
                }
                a class="btn btn-outline-primary" href="/imports" { "Back to imports" }
            })
            .render(),
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn operator() -> User<false> {
        User {
            id: "u1".to_string(),
            email: "admin@example.com".to_string(),
            username: "admin".to_string(),
            password_hash: String::new(),
            created_at: Utc::now().naive_utc(),
        }
    }

    fn html(page: SuccessResponse) -> String {
        match page {
            SuccessResponse::Success(rendered) => rendered.into_inner(),
            SuccessResponse::SeeOther(_) => panic!("expected a page"),
        }
    }

    #[test]
    fn a_no_op_upload_is_called_out() {
        let summary = ImportSummary {
            coaches_skipped: 3,
            ..Default::default()
        };

        let page = html(summary_page(operator(), &summary));

        assert!(page.contains("nothing new was created"));
    }

    #[test]
    fn a_productive_upload_shows_plain_counts() {
        let summary = ImportSummary {
            coaches_created: 2,
            ..Default::default()
        };

        let page = html(summary_page(operator(), &summary));

        assert!(!page.contains("nothing new was created"));
        assert!(page.contains("2 coach travel record(s) created"));
    }
}
