pub mod together;

pub use together::{TogetherClient, TogetherConfig};
