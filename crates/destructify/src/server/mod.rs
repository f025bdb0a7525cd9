pub(crate) mod commands;
pub(crate) mod handler;
pub(crate) mod indexing;
pub(crate) mod state;

pub use commands::{EXPAND_COMMAND, RESCAN_COMMAND};
pub use state::DestructifyServer;
