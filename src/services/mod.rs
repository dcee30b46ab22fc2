pub mod document_store;
pub mod messaging;

pub use document_store::DocumentStore;
pub use messaging::MessagingService;
