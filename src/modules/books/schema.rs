pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    isbn TEXT NOT NULL UNIQUE,
    genre TEXT NOT NULL DEFAULT 'other' CHECK (genre IN ('fiction', 'non-fiction', 'science', 'history', 'biography', 'technology', 'art', 'sports', 'other')),
    publisher TEXT,
    publication_year INTEGER NOT NULL CHECK (publication_year BETWEEN 1000 AND 2024),
    page_count INTEGER CHECK (page_count IS NULL OR page_count > 0),
    description TEXT,
    status TEXT NOT NULL DEFAULT 'available' CHECK (status IN ('available', 'loaned', 'reserved', 'lost')),
    date_added TEXT NOT NULL,
    date_modified TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_books_title ON books(title);
CREATE INDEX IF NOT EXISTS idx_books_author ON books(author);
CREATE INDEX IF NOT EXISTS idx_books_status ON books(status);
CREATE INDEX IF NOT EXISTS idx_books_genre ON books(genre);
CREATE INDEX IF NOT EXISTS idx_books_date_added ON books(date_added);
"#;
