//! Books repository

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

use super::{clamp_limit, like_pattern, referenced_conflict};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List books with optional text search and category filter
    pub async fn list(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let pattern = like_pattern(query.q.as_deref());
        let category = query
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let rows = sqlx::query_as::<_, Book>(
            r#"
            SELECT b.*,
                   (SELECT COUNT(*) FROM copies c
                     WHERE c.book_id = b.id AND c.status = 'available') AS nb_available
            FROM books b
            WHERE ($1::text IS NULL OR b.title ILIKE $1 OR b.author ILIKE $1)
              AND ($2::text IS NULL OR LOWER(b.category) = LOWER($2))
            ORDER BY b.title, b.id
            LIMIT $3
            "#,
        )
        .bind(pattern)
        .bind(category)
        .bind(clamp_limit(query.limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    /// Create a book (title and author already validated)
    pub async fn create(&self, title: &str, author: &str, data: &CreateBook) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, category, publisher, edition, year, location)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(author)
        .bind(&data.category)
        .bind(&data.publisher)
        .bind(&data.edition)
        .bind(data.year)
        .bind(&data.location)
        .fetch_one(&self.pool)
        .await?;

        Ok(book)
    }

    /// Partial update: only supplied fields are written
    pub async fn update(&self, id: i32, data: &UpdateBook) -> AppResult<Book> {
        if data.is_empty() {
            return self.get_by_id(id).await;
        }

        let sets = set_clauses(data);

        let query = format!("UPDATE books SET {} WHERE id = $1 RETURNING *", sets.join(", "));
        let mut builder = sqlx::query_as::<_, Book>(&query).bind(id);

        macro_rules! bind_f {
            ($field:expr) => {
                if let Some(ref val) = $field { builder = builder.bind(val); }
            };
        }

        bind_f!(data.title);
        bind_f!(data.author);
        bind_f!(data.category);
        bind_f!(data.publisher);
        bind_f!(data.edition);
        bind_f!(data.year);
        bind_f!(data.location);

        builder
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))
    }

    /// Delete a book (its copies go with it)
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| referenced_conflict(e, format!("Book {} has loans or requests on record", id)))?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }
        Ok(())
    }

    /// Whether a book exists, checked on an existing connection
    pub(crate) async fn exists_in(conn: &mut PgConnection, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(exists)
    }
}

/// `column = $n` assignments for the supplied fields.
///
/// `$1` is the book id, so fields take `$2` onwards in declaration order.
fn set_clauses(data: &UpdateBook) -> Vec<String> {
    let mut sets: Vec<String> = Vec::new();

    macro_rules! add_f {
        ($field:expr, $name:expr) => {
            if $field.is_some() {
                let placeholder = sets.len() + 2;
                sets.push(format!("{} = ${}", $name, placeholder));
            }
        };
    }

    add_f!(data.title, "title");
    add_f!(data.author, "author");
    add_f!(data.category, "category");
    add_f!(data.publisher, "publisher");
    add_f!(data.edition, "edition");
    add_f!(data.year, "year");
    add_f!(data.location, "location");

    sets
}
