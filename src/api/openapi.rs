//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, copies, health, loans, notifications, requests, returns, sanctions, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "SisBib API",
        version = "0.3.0",
        description = "Library management backend: catalog, requests, loans, returns and sanctions",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api", description = "SisBib API")
    ),
    paths(
        // Health
        health::health_check,
        // Users
        users::login,
        users::list_users,
        users::create_user,
        // Catalog
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        copies::list_copies,
        copies::create_copy,
        copies::update_copy,
        copies::delete_copy,
        // Requests
        requests::create_request,
        requests::list_requests,
        requests::get_request,
        requests::update_request,
        // Loans
        loans::create_loan,
        loans::list_loans,
        loans::get_receipt,
        returns::register_return,
        // Sanctions
        sanctions::list_sanctions,
        sanctions::block_status,
        // Notifications
        notifications::notify_overdue,
        notifications::test_email,
    ),
    components(
        schemas(
            // Enums
            crate::models::enums::CopyStatus,
            crate::models::enums::LoanType,
            crate::models::enums::RequestStatus,
            crate::models::enums::Role,
            // Users
            crate::models::user::User,
            crate::models::user::UserSummary,
            crate::models::user::CreateUser,
            crate::models::user::LoginRequest,
            users::LoginResponse,
            users::UsersListResponse,
            users::UserResponse,
            // Catalog
            crate::models::book::Book,
            crate::models::book::BookDetails,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::copy::BookCopy,
            crate::models::copy::CreateCopy,
            crate::models::copy::UpdateCopy,
            books::BooksListResponse,
            books::BookResponse,
            books::BookDetailsResponse,
            copies::CopiesListResponse,
            copies::CopyResponse,
            // Requests
            crate::models::request::Request,
            crate::models::request::RequestItem,
            crate::models::request::RequestSummary,
            crate::models::request::RequestDetails,
            crate::models::request::NewRequestItem,
            crate::models::request::CreateRequest,
            crate::models::request::UpdateRequest,
            requests::RequestsListResponse,
            requests::RequestDetailsResponse,
            requests::RequestResponse,
            // Loans
            crate::models::loan::Loan,
            crate::models::loan::LoanDetails,
            crate::models::loan::CreateLoan,
            crate::models::loan::LoanReceipt,
            crate::models::loan::RegisterReturn,
            crate::models::loan::ReturnOutcome,
            loans::LoanResponse,
            loans::LoansListResponse,
            loans::ReceiptResponse,
            returns::ReturnResponse,
            // Sanctions
            crate::models::sanction::Sanction,
            crate::models::sanction::BlockStatus,
            sanctions::SanctionsListResponse,
            sanctions::BlockStatusResponse,
            // Notifications
            crate::services::notifications::SweepReport,
            notifications::SweepResponse,
            notifications::TestEmailRequest,
            notifications::TestEmailResponse,
            // Common
            health::HealthResponse,
            super::OkResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check"),
        (name = "users", description = "Login and user directory"),
        (name = "catalog", description = "Books and copies"),
        (name = "requests", description = "Pickup requests"),
        (name = "loans", description = "Loans, receipts and returns"),
        (name = "sanctions", description = "Borrowing sanctions"),
        (name = "notifications", description = "Overdue notices and mail test")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_spanish_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in ["/prestamos", "/devoluciones", "/solicitudes/{id}", "/sanciones/estado"] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {} in {:?}",
                expected,
                paths
            );
        }
    }
}
