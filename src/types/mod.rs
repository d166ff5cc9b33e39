// Public modules
pub mod chat_completion_request;
pub mod chat_completion_response;
pub mod image_data_uri;
pub mod message;

// Re-exports
pub use chat_completion_request::{
    ChatCompletionRequest, ChatContent, ChatMessageParam, ChatRole, ContentPart, ImageUrl,
};
pub use chat_completion_response::{ChatCompletionResponse, Choice, ChoiceMessage};
pub use image_data_uri::{ImageDataUri, ImageMediaType};
pub use message::{Message, MessageId, Sender};
