// MCP server exposing GLM delegation tools to agent hosts over stdio

pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;
pub use tools::ToolRegistry;
