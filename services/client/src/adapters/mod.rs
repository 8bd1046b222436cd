pub mod auth_http;
pub mod chat_http;
pub mod documents_http;
pub mod http;
pub mod options_http;
pub mod storage;

pub use auth_http::HttpAuthAdapter;
pub use chat_http::HttpChatAdapter;
pub use documents_http::HttpDocumentAdapter;
pub use http::BackendClient;
pub use options_http::HttpOptionsAdapter;
pub use storage::{JsonFileStorage, MemoryStorage};
