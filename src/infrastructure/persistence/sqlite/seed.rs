//! 示例数据 - 空库首次启动时写入

use uuid::Uuid;

use crate::application::ports::{RepositoryError, UserBookRepositoryPort};
use crate::domain::library::{BookDetails, BookInfo, UserBook};

/// 示例书目，书籍 ID 即 ISBN
pub fn sample_books() -> Vec<BookDetails> {
    vec![
        BookDetails {
            isbn: Some("978-0-544-00341-5".to_string()),
            publisher: Some("Houghton Mifflin Harcourt".to_string()),
            publication_year: Some(1937),
            total_pages: Some(310),
            genre: Some("Fantasy".to_string()),
            description: Some(
                "A reluctant hobbit, Bilbo Baggins, sets out to the Lonely Mountain with a \
                 spirited group of dwarves to reclaim their mountain home from the dragon Smaug."
                    .to_string(),
            ),
            ..BookDetails::new("The Hobbit", "J.R.R. Tolkien")
        },
        BookDetails {
            isbn: Some("978-0-7432-7356-5".to_string()),
            publisher: Some("Doubleday".to_string()),
            publication_year: Some(2003),
            total_pages: Some(454),
            genre: Some("Mystery/Thriller".to_string()),
            description: Some(
                "A murder in the Louvre Museum and clues in Da Vinci paintings lead to a \
                 religious mystery protected by a secret society."
                    .to_string(),
            ),
            ..BookDetails::new("The Da Vinci Code", "Dan Brown")
        },
        BookDetails {
            isbn: Some("978-0-618-00222-1".to_string()),
            publisher: Some("Houghton Mifflin".to_string()),
            publication_year: Some(1954),
            total_pages: Some(423),
            genre: Some("Fantasy".to_string()),
            description: Some(
                "Frodo Baggins finds himself faced with an immense task, as his elderly cousin \
                 Bilbo entrusts the Ring to his care."
                    .to_string(),
            ),
            ..BookDetails::new("The Lord of the Rings: The Fellowship of the Ring", "J.R.R. Tolkien")
        },
    ]
}

/// 用户书库为空时写入示例书籍，返回写入数量
pub async fn seed_sample_data(
    repo: &dyn UserBookRepositoryPort,
    user_id: Uuid,
) -> Result<usize, RepositoryError> {
    let existing = repo.count_by_user(user_id).await?;
    if existing > 0 {
        tracing::info!(
            count = existing,
            "Library already contains books, skipping seeding"
        );
        return Ok(0);
    }

    let mut seeded = 0;
    for details in sample_books() {
        let book_id = details.isbn.clone().unwrap_or_else(|| details.title.clone());
        let info = BookInfo::new(details)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        let book = UserBook::new(book_id, user_id, info, None)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        repo.add(&book).await?;
        seeded += 1;
    }

    tracing::info!(count = seeded, user_id = %user_id, "Seeded sample books");
    Ok(seeded)
}
