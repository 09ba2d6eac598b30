//! MCP tool surface over stdio

pub mod dispatcher;
pub mod protocol;
pub mod server;
pub mod tools;

pub use dispatcher::ToolDispatcher;
pub use server::McpServer;
