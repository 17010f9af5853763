pub mod domain;
pub mod gateway;
pub mod ports;
pub mod views;

pub use domain::{ChatHistoryEntry, ChatMessage, Flashcard, Priority, Reminder, Role, Summary, View};
pub use gateway::{StudyGateway, DEFAULT_MODEL};
pub use ports::{ApiKey, GenerationRequest, GenerativeModelService, PortError, PortResult};
