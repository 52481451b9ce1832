#![forbid(unsafe_code)]

//! The parameter-binding core of a PostgreSQL database driver: a
//! two-pass query rewriter, a value encoder registry with a
//! user-extensible adapter microprotocol, a growable typed-parameter
//! buffer, and the execution/cursor layer that ties them to an
//! out-of-scope transport collaborator.

pub mod adapter;
pub mod conn_context;
pub mod cursor;
mod encoder;
pub mod error;
pub mod execution;
mod mogrify;
pub mod oid;
pub mod param_buffer;
mod rewriter;
pub mod type_info;
pub mod typecast;
pub mod value;
pub mod vars;

pub use conn_context::{BinaryPathPolicy, ConnContext};
pub use cursor::{Cursor, TransactionMark};
pub use error::{BoxDynError, Error, Result};
pub use execution::Transport;
pub use oid::Oid;
pub use param_buffer::{ParameterBuffer, ParameterSlot};
pub use type_info::PgValueFormat;
pub use value::Value;
pub use vars::Vars;
