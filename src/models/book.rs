//! Book (catalog entry) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::copy::BookCopy;

/// Book record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub category: Option<String>,
    pub publisher: Option<String>,
    pub edition: Option<String>,
    pub year: Option<i32>,
    /// Shelf location
    pub location: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    /// Number of copies currently available (list queries only)
    #[sqlx(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nb_available: Option<i64>,
}

/// Book with its copies
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub copies: Vec<BookCopy>,
}

/// Create book request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBook {
    #[serde(alias = "titulo")]
    pub title: Option<String>,
    #[serde(alias = "autor")]
    pub author: Option<String>,
    #[serde(alias = "categoria")]
    pub category: Option<String>,
    #[serde(alias = "editorial")]
    pub publisher: Option<String>,
    #[serde(alias = "edicion")]
    pub edition: Option<String>,
    #[serde(alias = "anio")]
    pub year: Option<i32>,
    #[serde(alias = "ubicacion")]
    pub location: Option<String>,
}

/// Update book request (partial)
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateBook {
    #[serde(alias = "titulo")]
    pub title: Option<String>,
    #[serde(alias = "autor")]
    pub author: Option<String>,
    #[serde(alias = "categoria")]
    pub category: Option<String>,
    #[serde(alias = "editorial")]
    pub publisher: Option<String>,
    #[serde(alias = "edicion")]
    pub edition: Option<String>,
    #[serde(alias = "anio")]
    pub year: Option<i32>,
    #[serde(alias = "ubicacion")]
    pub location: Option<String>,
}

impl UpdateBook {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.category.is_none()
            && self.publisher.is_none()
            && self.edition.is_none()
            && self.year.is_none()
            && self.location.is_none()
    }
}

/// Book query parameters
#[derive(Debug, Default, Deserialize)]
pub struct BookQuery {
    /// Search in title and author
    pub q: Option<String>,
    #[serde(alias = "categoria")]
    pub category: Option<String>,
    pub limit: Option<i64>,
}
