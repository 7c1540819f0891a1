use rolemask::{Config, Store};
use tempfile::TempDir;

/// Fresh store in its own temp dir. Keep the `TempDir` alive for the test.
pub fn setup() -> (Store, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = Config { map_size: 1 << 24, ..Config::new(dir.path()) };
    (Store::open(&config).unwrap(), dir)
}
