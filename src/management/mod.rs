mod auth;
mod history;
mod store;

pub use auth::ACCESS_TOKEN_KEY;
pub use auth::CODE_VERIFIER_KEY;
pub use auth::TokenManager;
pub use history::HISTORY_KEY;
pub use history::HISTORY_LIMIT;
pub use history::HistoryManager;
pub use store::FileStore;
pub use store::KeyValueStore;
pub use store::MemoryStore;
