//! Integration tests against a running server and database.
//!
//! Run with: cargo test --test integration -- --ignored
//! `DATABASE_URL` must point at the server's database.

mod api_tests;
mod db;
mod repository_tests;
