//! Catalog service: books and their copies

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookDetails, BookQuery, CreateBook, UpdateBook},
        copy::{BookCopy, CreateCopy, UpdateCopy},
        enums::CopyStatus,
    },
    repository::Repository,
};

use super::release::ReleaseScheduler;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    release: ReleaseScheduler,
}

impl CatalogService {
    pub fn new(repository: Repository, release: ReleaseScheduler) -> Self {
        Self { repository, release }
    }

    pub async fn list_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        self.repository.books.list(query).await
    }

    /// Book with its copies
    pub async fn get_book(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.repository.books.get_by_id(id).await?;
        let copies = self.repository.copies.list_for_book(id).await?;
        Ok(BookDetails { book, copies })
    }

    pub async fn create_book(&self, data: CreateBook) -> AppResult<Book> {
        let title = required_text("title", data.title.as_deref())?.to_string();
        let author = required_text("author", data.author.as_deref())?.to_string();

        let book = self.repository.books.create(&title, &author, &data).await?;
        tracing::info!("Created book {} \"{}\"", book.id, book.title);
        Ok(book)
    }

    pub async fn update_book(&self, id: i32, mut data: UpdateBook) -> AppResult<Book> {
        if let Some(title) = data.title.take() {
            data.title = Some(required_text("title", Some(&title))?.to_string());
        }
        if let Some(author) = data.author.take() {
            data.author = Some(required_text("author", Some(&author))?.to_string());
        }
        self.repository.books.update(id, &data).await
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!("Deleted book {}", id);
        Ok(())
    }

    /// Copies of an existing book
    pub async fn list_copies(&self, book_id: i32) -> AppResult<Vec<BookCopy>> {
        self.repository.books.get_by_id(book_id).await?;
        self.repository.copies.list_for_book(book_id).await
    }

    pub async fn create_copy(&self, data: CreateCopy) -> AppResult<BookCopy> {
        let book_id = data
            .book_id
            .ok_or_else(|| AppError::Validation("book_id is required".to_string()))?;
        let status = data.status.unwrap_or_default();
        if status == CopyStatus::Borrowed {
            return Err(AppError::Validation(
                "A copy becomes borrowed only through a loan".to_string(),
            ));
        }

        let copy = self
            .repository
            .copies
            .create(book_id, status, data.location.as_deref())
            .await?;

        if copy.status == CopyStatus::Reconditioning {
            self.release.schedule_best_effort(copy.id, Utc::now());
        }
        Ok(copy)
    }

    /// Partial update; moving a copy into reconditioning starts its release timer
    pub async fn update_copy(&self, id: i32, data: UpdateCopy) -> AppResult<BookCopy> {
        let (copy, previous) = self.repository.copies.update(id, &data).await?;

        if copy.status == CopyStatus::Reconditioning && previous != CopyStatus::Reconditioning {
            self.release.schedule_best_effort(copy.id, Utc::now());
        }
        Ok(copy)
    }

    pub async fn delete_copy(&self, id: i32) -> AppResult<()> {
        self.repository.copies.delete(id).await?;
        tracing::info!("Deleted copy {}", id);
        Ok(())
    }
}

/// Trimmed value of a required text field
fn required_text<'a>(field: &str, value: Option<&'a str>) -> AppResult<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text("title", Some("  Rayuela ")).unwrap(), "Rayuela");
        assert!(matches!(required_text("title", Some("   ")), Err(AppError::Validation(_))));
        assert!(matches!(required_text("author", None), Err(AppError::Validation(_))));
    }
}
