pub mod error;
pub mod models;
pub mod provider;
pub mod traits;

// Re-export public APIs
pub use error::GenerationError;
pub use models::ProviderConfig;
pub use provider::{create_provider, GeminiProvider};
pub use traits::TextGenerator;
