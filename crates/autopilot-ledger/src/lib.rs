pub mod config_file;
pub mod error;
pub mod jsonl;
pub mod lock;
pub mod memory;
pub mod paths;
pub mod record;
pub mod sqlite;
pub mod store;

pub use config_file::{
    get_key, init_workspace, load_config, read_config_map, set_config_value, write_atomic,
};
pub use error::StoreError;
pub use jsonl::JsonlStore;
pub use lock::WorkspaceLock;
pub use memory::{MemoryStore, NullStore};
pub use paths::AutopilotPaths;
pub use record::{Record, Stream};
pub use sqlite::SqliteStore;
pub use store::{open_store, LogStore};
