pub mod artifacts;
pub mod conversation;
pub mod dispatcher;
pub mod errors;
pub mod lookup;
pub mod milestones;
pub mod models;
pub mod prompt_template;
pub mod providers;
pub mod session;
