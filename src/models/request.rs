//! Pickup request (solicitud) model and its line items

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::RequestStatus;
use crate::error::{AppError, AppResult};

/// Request header
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Request {
    pub id: i32,
    pub user_id: i32,
    pub status: RequestStatus,
    pub librarian_id: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request line item
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RequestItem {
    pub id: i32,
    pub request_id: i32,
    pub book_id: Option<i32>,
    pub copy_id: Option<i32>,
    pub quantity: i32,
}

/// Request row for listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RequestSummary {
    pub id: i32,
    pub user_id: i32,
    pub requester_name: String,
    pub status: RequestStatus,
    pub librarian_id: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub item_count: i64,
}

/// Request with its items
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RequestDetails {
    #[serde(flatten)]
    pub request: Request,
    pub items: Vec<RequestItem>,
}

/// Line item of a new request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewRequestItem {
    #[serde(alias = "id_libro", alias = "libro_id")]
    pub book_id: Option<i32>,
    #[serde(alias = "id_ejemplar", alias = "ejemplar_id")]
    pub copy_id: Option<i32>,
    #[serde(alias = "cantidad")]
    pub quantity: Option<i32>,
}

impl NewRequestItem {
    /// Quantity to store (defaults to 1)
    pub fn effective_quantity(&self) -> i32 {
        self.quantity.unwrap_or(1)
    }
}

/// Create request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRequest {
    pub user_id: Option<i32>,
    #[serde(default)]
    pub items: Vec<NewRequestItem>,
    #[serde(alias = "notas")]
    pub notes: Option<String>,
}

impl CreateRequest {
    /// Shape checks done before touching the store
    pub fn validate_shape(&self) -> AppResult<i32> {
        let user_id = self
            .user_id
            .ok_or_else(|| AppError::Validation("user_id is required".to_string()))?;

        if self.items.is_empty() {
            return Err(AppError::Validation(
                "A request needs at least one item".to_string(),
            ));
        }

        for (idx, item) in self.items.iter().enumerate() {
            if item.book_id.is_none() && item.copy_id.is_none() {
                return Err(AppError::Validation(format!(
                    "Item {} must reference a book or a copy",
                    idx + 1
                )));
            }
            if item.effective_quantity() < 1 {
                return Err(AppError::Validation(format!(
                    "Item {} quantity must be at least 1",
                    idx + 1
                )));
            }
        }

        Ok(user_id)
    }
}

/// Update request body: any subset of status, librarian and notes
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateRequest {
    #[serde(alias = "estado")]
    pub status: Option<RequestStatus>,
    #[serde(alias = "bibliotecario_id")]
    pub librarian_id: Option<i32>,
    #[serde(alias = "notas")]
    pub notes: Option<String>,
}

impl UpdateRequest {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.librarian_id.is_none() && self.notes.is_none()
    }
}

/// Request list query parameters
#[derive(Debug, Default, Deserialize)]
pub struct RequestQuery {
    /// Comma-separated statuses
    #[serde(alias = "estado")]
    pub status: Option<String>,
    #[serde(alias = "bibliotecario_id")]
    pub librarian_id: Option<i32>,
    #[serde(alias = "desde")]
    pub from: Option<DateTime<Utc>>,
    #[serde(alias = "hasta")]
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(book_id: Option<i32>, copy_id: Option<i32>, quantity: Option<i32>) -> NewRequestItem {
        NewRequestItem { book_id, copy_id, quantity }
    }

    #[test]
    fn test_requires_user_and_items() {
        let req = CreateRequest { user_id: None, items: vec![item(Some(1), None, None)], notes: None };
        assert!(matches!(req.validate_shape(), Err(AppError::Validation(_))));

        let req = CreateRequest { user_id: Some(1), items: vec![], notes: None };
        assert!(matches!(req.validate_shape(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_item_reference_and_quantity() {
        let req = CreateRequest { user_id: Some(1), items: vec![item(None, None, Some(1))], notes: None };
        assert!(req.validate_shape().is_err());

        let req = CreateRequest { user_id: Some(1), items: vec![item(Some(2), None, Some(0))], notes: None };
        assert!(req.validate_shape().is_err());

        let req = CreateRequest {
            user_id: Some(7),
            items: vec![item(Some(2), None, None), item(None, Some(9), Some(2)), item(Some(2), Some(4), None)],
            notes: None,
        };
        assert_eq!(req.validate_shape().unwrap(), 7);
        assert_eq!(req.items[0].effective_quantity(), 1);
    }

    #[test]
    fn test_update_body_parses_spanish_alias() {
        let update: UpdateRequest = serde_json::from_str(r#"{"estado": "ready"}"#).unwrap();
        assert_eq!(update.status, Some(RequestStatus::Ready));
        assert!(!update.is_empty());
        assert!(UpdateRequest::default().is_empty());
    }
}
