pub mod error;
pub mod gemini;
pub mod supabase;
pub mod tmdb;

pub use error::UpstreamError;
