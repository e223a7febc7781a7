//! Shared domain enums
//!
//! All of them are stored as lowercase `TEXT` columns guarded by `CHECK`
//! constraints in the schema.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::ToSchema;

use crate::config::LoansConfig;
use crate::error::{AppError, AppResult};

/// Implements the SQLx TEXT mapping for an enum exposing `as_str` and `FromStr<Err = String>`
macro_rules! text_enum_sqlx {
    ($ty:ty) => {
        impl sqlx::Type<Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<Postgres>>::compatible(ty)
            }
        }

        impl<'r> Decode<'r, Postgres> for $ty {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s: String = Decode::<Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> sqlx::encode::IsNull {
                <&str as Encode<Postgres>>::encode(self.as_str(), buf)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

// ---------------------------------------------------------------------------
// CopyStatus
// ---------------------------------------------------------------------------

/// Status of a physical copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CopyStatus {
    #[default]
    Available,
    Borrowed,
    Reconditioning,
}

impl CopyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CopyStatus::Available => "available",
            CopyStatus::Borrowed => "borrowed",
            CopyStatus::Reconditioning => "reconditioning",
        }
    }
}

impl std::str::FromStr for CopyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "available" | "disponible" => Ok(CopyStatus::Available),
            "borrowed" | "prestado" => Ok(CopyStatus::Borrowed),
            "reconditioning" | "reacondicionamiento" => Ok(CopyStatus::Reconditioning),
            _ => Err(format!("Invalid copy status: {}", s)),
        }
    }
}

text_enum_sqlx!(CopyStatus);

// ---------------------------------------------------------------------------
// LoanType
// ---------------------------------------------------------------------------

/// Loan type: in the reading room or taken home
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoanType {
    Room,
    Home,
}

impl LoanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanType::Room => "room",
            LoanType::Home => "home",
        }
    }

    /// Parse user input, reporting unknown values as `InvalidLoanType`
    pub fn parse(input: &str) -> AppResult<Self> {
        input
            .parse()
            .map_err(|_| AppError::InvalidLoanType(input.trim().to_string()))
    }

    /// Due instant for a loan of this type reserved at `reserved_at`
    pub fn due_at(&self, reserved_at: DateTime<Utc>, policy: &LoansConfig) -> DateTime<Utc> {
        match self {
            LoanType::Room => reserved_at + Duration::minutes(policy.room_minutes),
            LoanType::Home => reserved_at + Duration::days(policy.home_days),
        }
    }
}

impl std::str::FromStr for LoanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "room" | "sala" => Ok(LoanType::Room),
            "home" | "domicilio" => Ok(LoanType::Home),
            _ => Err(format!("Invalid loan type: {}", s)),
        }
    }
}

text_enum_sqlx!(LoanType);

// ---------------------------------------------------------------------------
// RequestStatus
// ---------------------------------------------------------------------------

/// Pickup request (solicitud) workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Ready,
    Served,
    Canceled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Ready => "ready",
            RequestStatus::Served => "served",
            RequestStatus::Canceled => "canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Served | RequestStatus::Canceled)
    }

    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, next),
            (Pending, Ready) | (Pending, Canceled) | (Ready, Served) | (Ready, Canceled)
        )
    }

    /// Validate `self -> next` against the transition table
    pub fn transition_to(self, next: RequestStatus) -> AppResult<RequestStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::InvalidTransition { from: self, to: next })
        }
    }

    /// Parse a comma-separated status filter ("pending,ready")
    pub fn parse_list(input: &str) -> AppResult<Vec<RequestStatus>> {
        input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse().map_err(AppError::Validation))
            .collect()
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(RequestStatus::Pending),
            "ready" => Ok(RequestStatus::Ready),
            "served" => Ok(RequestStatus::Served),
            "canceled" | "cancelled" => Ok(RequestStatus::Canceled),
            _ => Err(format!("Invalid request status: {}", s)),
        }
    }
}

text_enum_sqlx!(RequestStatus);

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Librarian,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Librarian => "librarian",
            Role::Client => "client",
        }
    }

    /// Normalize free-text role labels ("ADMIN", " Cliente ") to a role
    pub fn normalize(input: &str) -> AppResult<Self> {
        input.parse().map_err(AppError::Validation)
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Librarian)
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" | "administrador" | "administradora" | "administrator" => Ok(Role::Admin),
            "librarian" | "bibliotecario" | "bibliotecaria" => Ok(Role::Librarian),
            "client" | "cliente" | "reader" | "lector" | "lectora" => Ok(Role::Client),
            _ => Err(format!("Unrecognized role: {}", s.trim())),
        }
    }
}

text_enum_sqlx!(Role);
