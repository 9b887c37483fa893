pub mod migrations;
pub mod pool;
pub mod profiles;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool_from_url, create_pool_from_url_checked, DbPoolError, PgPool};
pub use profiles::PgProfileStore;
