pub mod assistant;
pub mod llm;

pub use llm::{
    ChatError, CompletionOptions, CompletionOverrides, CompletionResponse, Message, ModelClient,
    RequestFailure, Role,
};
