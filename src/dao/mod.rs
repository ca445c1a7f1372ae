/// Key naming for every structure the leaderboard persists.
pub mod keys;
/// Key-value store abstraction and its backends.
pub mod kv_store;
/// Records read back from the key-value store.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
