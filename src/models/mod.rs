//! Data models for SisBib

pub mod book;
pub mod copy;
pub mod enums;
pub mod loan;
pub mod request;
pub mod sanction;
pub mod user;

// Re-export commonly used types
pub use book::Book;
pub use copy::BookCopy;
pub use enums::{CopyStatus, LoanType, RequestStatus, Role};
pub use loan::{Loan, LoanDetails, LoanReceipt};
pub use request::{Request, RequestItem};
pub use sanction::Sanction;
pub use user::User;
