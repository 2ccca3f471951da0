//! Borrower endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::borrower::{Borrower, CreateBorrower, UpdateBorrower},
};

/// List all borrowers
#[utoipa::path(
    get,
    path = "/borrowers",
    tag = "borrowers",
    responses(
        (status = 200, description = "List of borrowers", body = Vec<Borrower>)
    )
)]
pub async fn list_borrowers(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<Borrower>>> {
    let borrowers = state.services.borrowers.list().await?;
    Ok(Json(borrowers))
}

/// Get borrower by ID
#[utoipa::path(
    get,
    path = "/borrowers/{id}",
    tag = "borrowers",
    params(
        ("id" = i64, Path, description = "Borrower ID")
    ),
    responses(
        (status = 200, description = "Borrower details", body = Borrower),
        (status = 404, description = "Borrower not found")
    )
)]
pub async fn get_borrower(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Borrower>> {
    let borrower = state.services.borrowers.get(id).await?;
    Ok(Json(borrower))
}

/// Find-or-create a borrower by email. Returns 201 when a new borrower
/// was created and 200 when an existing one was reused (with contact
/// details refreshed).
#[utoipa::path(
    post,
    path = "/borrowers",
    tag = "borrowers",
    request_body = CreateBorrower,
    responses(
        (status = 201, description = "Borrower created", body = Borrower),
        (status = 200, description = "Existing borrower returned", body = Borrower),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_borrower(
    State(state): State<crate::AppState>,
    Json(borrower): Json<CreateBorrower>,
) -> AppResult<(StatusCode, Json<Borrower>)> {
    let (borrower, created) = state.services.borrowers.resolve_or_create(borrower).await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(borrower)))
}

/// Update a borrower
#[utoipa::path(
    put,
    path = "/borrowers/{id}",
    tag = "borrowers",
    params(
        ("id" = i64, Path, description = "Borrower ID")
    ),
    request_body = UpdateBorrower,
    responses(
        (status = 200, description = "Borrower updated", body = Borrower),
        (status = 404, description = "Borrower not found"),
        (status = 409, description = "Email already taken")
    )
)]
pub async fn update_borrower(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
    Json(update): Json<UpdateBorrower>,
) -> AppResult<Json<Borrower>> {
    let borrower = state.services.borrowers.update(id, update).await?;
    Ok(Json(borrower))
}

/// Delete a borrower
#[utoipa::path(
    delete,
    path = "/borrowers/{id}",
    tag = "borrowers",
    params(
        ("id" = i64, Path, description = "Borrower ID")
    ),
    responses(
        (status = 204, description = "Borrower deleted"),
        (status = 404, description = "Borrower not found"),
        (status = 409, description = "Borrower has loan history")
    )
)]
pub async fn delete_borrower(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.borrowers.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
