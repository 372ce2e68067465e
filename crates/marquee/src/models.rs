//! These models represent the objects passed around by the assistant
//!
//! The wire formats we interact with are deliberately narrow:
//! - chat messages, plain role + text, sent to and from the model backend
//! - function calls, a JSON object the model writes as its whole reply
//! - tool schemas, declared to the backend when a native function call is wanted
pub mod function_call;
pub mod message;
pub mod role;
pub mod tool;
