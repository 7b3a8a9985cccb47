mod errors;
pub use errors::{PostgresError, PostgresResult};

mod tls;
pub use tls::{SslModeOverride, make_connector, parse_conn_str};

mod pool;
pub use pool::{POOL_SIZE_DEFAULT, PgSslCerts, PostgresPool};
