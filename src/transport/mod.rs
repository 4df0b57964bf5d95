mod canned_server;
mod interface;
mod remote_server;

pub use canned_server::{make_canned_server, CannedServer};
pub use interface::Transport;
pub use remote_server::make_remote_server;
