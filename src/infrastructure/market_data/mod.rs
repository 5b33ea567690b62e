pub mod csv_history;
pub mod rate_limited_repository;

pub use csv_history::{CsvQuoteProvider, load_price_history};
pub use rate_limited_repository::RateLimitedQuoteRepository;
