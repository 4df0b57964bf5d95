extern crate serde;
extern crate serde_json;

extern crate clap;
extern crate itertools;
#[macro_use]
extern crate lazy_static;
extern crate lexical_sort;
extern crate tracing;
extern crate tracing_subscriber;
extern crate uuid;

pub mod config;
pub mod dispatch;
pub mod error;
pub mod heap;
pub mod logging;
pub mod output;
pub mod transport;

pub use error::{ClientError, Result};
