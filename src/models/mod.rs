pub mod movie;

pub use movie::{GenreMap, MovieRecord, PersistedRecord};
