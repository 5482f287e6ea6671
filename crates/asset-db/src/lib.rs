pub mod assets;
pub mod types;

pub use sqlx::postgres::PgPool;
pub use types::*;
