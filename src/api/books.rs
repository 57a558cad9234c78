//! Book catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::book::{BookDetails, CreateBook, UpdateBook},
};

/// List all books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "List of books", body = Vec<BookDetails>)
    )
)]
pub async fn list_books(State(state): State<crate::AppState>) -> AppResult<Json<Vec<BookDetails>>> {
    let books = state.services.books.list().await?;
    Ok(Json(books))
}

/// Get book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = BookDetails),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<BookDetails>> {
    let book = state.services.books.get_by_id(id).await?;
    Ok(Json(book))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = BookDetails),
        (status = 400, description = "Invalid input or ISBN already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<BookDetails>)> {
    request.validate()?;

    let book = state.services.books.create(&request).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Update title and number of copies
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = BookDetails),
        (status = 400, description = "Total copies below the borrowed count", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateBook>,
) -> AppResult<Json<BookDetails>> {
    request.validate()?;

    let book = state.services.books.update(id, &request).await?;
    Ok(Json(book))
}

/// Delete a book without loan history
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 400, description = "Book has loans", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.books.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Link an author to a book
#[utoipa::path(
    post,
    path = "/books/{book_id}/authors/{author_id}",
    tag = "books",
    params(
        ("book_id" = i64, Path, description = "Book ID"),
        ("author_id" = i64, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Book with its authors", body = BookDetails),
        (status = 404, description = "Book or author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_author(
    State(state): State<crate::AppState>,
    Path((book_id, author_id)): Path<(i64, i64)>,
) -> AppResult<Json<BookDetails>> {
    let book = state.services.books.add_author(book_id, author_id).await?;
    Ok(Json(book))
}

/// Unlink an author from a book
#[utoipa::path(
    delete,
    path = "/books/{book_id}/authors/{author_id}",
    tag = "books",
    params(
        ("book_id" = i64, Path, description = "Book ID"),
        ("author_id" = i64, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Book with its authors", body = BookDetails),
        (status = 404, description = "Book or author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn remove_author(
    State(state): State<crate::AppState>,
    Path((book_id, author_id)): Path<(i64, i64)>,
) -> AppResult<Json<BookDetails>> {
    let book = state.services.books.remove_author(book_id, author_id).await?;
    Ok(Json(book))
}
