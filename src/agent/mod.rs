pub mod context;
pub mod history;
pub mod injection_defense;
pub mod loop_;
pub mod session;
pub mod system_prompt;

pub use history::History;
pub use loop_::{Agent, AgentReply, AgentSettings};
pub use session::Session;
