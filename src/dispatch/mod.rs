pub mod builder;
pub mod dispatcher;
pub mod interface;
pub mod request_chain;
pub mod session;

mod handle_class_defs;
mod handle_error;
mod handle_histo;
mod handle_init_ui;

pub use dispatcher::ResponseDispatcher;
pub use handle_histo::HISTOGRAM_TAB_NAME;
pub use interface::{RawResponse, ResponseHandler, ResponseKind};
pub use request_chain::{PendingRequestQueue, RequestChain};
pub use session::{RunSummary, Session, DEFAULT_QUERY};
