pub mod postgres_directory;

pub use postgres_directory::PostgresDirectoryStore;
