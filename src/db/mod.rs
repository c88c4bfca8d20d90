mod adapter;
mod connection;
mod error;
mod handle;
mod param;
mod query;

pub use adapter::*;
pub use connection::*;
pub use error::*;
pub use handle::*;
pub use param::*;
pub use query::*;
