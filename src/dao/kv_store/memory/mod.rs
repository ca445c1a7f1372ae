mod store;

pub use store::MemoryKvStore;
