use sqlx::PgPool;

/// Postgres-backed record store. Implements every repository trait so one
/// pool serves images, pending deletions and settings.
#[derive(Clone)]
pub struct SqlxRepo {
    pub pool: PgPool,
}

impl SqlxRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxRepo { pool }
    }
}
