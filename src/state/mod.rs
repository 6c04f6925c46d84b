mod sqlite;

pub use sqlite::SqliteMappingStore;
