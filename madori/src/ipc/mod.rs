mod client;
mod server;

pub use client::IpcClient;
pub use server::IpcServer;

/// Control socket address. Localhost TCP so daemon and client build the same
/// on every supported target.
pub const CONTROL_ADDR: &str = "127.0.0.1:42633";
