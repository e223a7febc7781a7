//! Copy (ejemplar, physical instance of a book) model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::CopyStatus;

/// Copy record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookCopy {
    pub id: i32,
    pub book_id: i32,
    pub status: CopyStatus,
    pub location: Option<String>,
}

/// Create copy request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCopy {
    #[serde(alias = "id_libro", alias = "libro_id")]
    pub book_id: Option<i32>,
    /// Initial status, `available` when omitted
    #[serde(alias = "estado")]
    pub status: Option<CopyStatus>,
    #[serde(alias = "ubicacion")]
    pub location: Option<String>,
}

/// Update copy request (partial)
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCopy {
    #[serde(alias = "estado")]
    pub status: Option<CopyStatus>,
    #[serde(alias = "ubicacion")]
    pub location: Option<String>,
}
