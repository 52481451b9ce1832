//! The Execution Adapter (§4.4): drives the rewriter, chooses the
//! typed-parameter or textual-fallback path, and hands the result to the
//! transport collaborator.
//!
//! `Transport` models the out-of-scope network layer (§1): the actual
//! socket, authentication, and frame encoding live elsewhere. Its methods
//! return a boxed future rather than being declared `async fn`, the same
//! pattern the executor traits in this codebase use to stay object-safe.

use futures_core::future::BoxFuture;

use crate::conn_context::ConnContext;
use crate::error::Error;
use crate::mogrify;
use crate::param_buffer::ParameterBuffer;
use crate::rewriter::{self, RewriteOutcome};
use crate::vars::Vars;

/// The out-of-scope transport collaborator (§1, §6): sends either a plain
/// SQL string or a rewritten query with its typed parameter buffer, and
/// reports the affected row count.
pub trait Transport: Send + Sync {
    fn send_simple<'t>(&'t mut self, sql: &'t str, async_flag: bool) -> BoxFuture<'t, Result<u64, Error>>;

    fn send_typed<'t>(
        &'t mut self,
        sql: &'t str,
        params: &'t ParameterBuffer,
        async_flag: bool,
    ) -> BoxFuture<'t, Result<u64, Error>>;
}

pub struct ExecutionOutcome {
    pub rowcount: u64,
    pub last_query: String,
}

/// §4.4's `execute(cursor, sql, vars, async_flag)` contract, minus the
/// cursor-precondition checks (§4.6), which the [`crate::cursor::Cursor`]
/// facade runs before ever calling this.
pub async fn execute(
    transport: &mut dyn Transport,
    sql: &str,
    vars: &Vars,
    named_cursor: Option<&str>,
    ctx: &ConnContext,
    async_flag: bool,
) -> Result<ExecutionOutcome, Error> {
    if sql.is_empty() {
        return Err(Error::programming("sql must be a non-empty string"));
    }

    let mut params = ParameterBuffer::new();
    let mut query = sql.to_string();

    if !vars.is_none() {
        match rewriter::rewrite(sql, vars, ctx)? {
            RewriteOutcome::Bound { sql: rewritten, params: bound } => {
                log::debug!("query rewritten to the typed-parameter path: {}", rewritten);
                query = rewritten;
                params = bound;
            }
            RewriteOutcome::Refused => {
                log::debug!("rewriter refused the template; falling back to textual mogrification");
                query = mogrify::mogrify(sql, vars, ctx)?;
            }
        }
    }

    if let Some(name) = named_cursor {
        query = format!("DECLARE {} CURSOR WITHOUT HOLD FOR {}", name, query);
        // A named-cursor declaration disables the typed-parameter path
        // (§4.4 step 5); anything already bound must be released.
        params.free_all();
    }

    let result = if !params.is_empty() {
        transport.send_typed(&query, &params, async_flag).await
    } else {
        transport.send_simple(&query, async_flag).await
    };

    params.free_all();

    let rowcount = result?;
    Ok(ExecutionOutcome { rowcount, last_query: query })
}

/// §4.4's `executemany`: iterate `vars_list`, calling `execute` per item,
/// accumulating `rowcount`; stop and propagate on the first error.
pub async fn execute_many(
    transport: &mut dyn Transport,
    sql: &str,
    vars_list: &[Vars],
    ctx: &ConnContext,
    async_flag: bool,
) -> Result<u64, Error> {
    let mut total = 0u64;
    for vars in vars_list {
        let outcome = execute(transport, sql, vars, None, ctx, async_flag).await?;
        total += outcome.rowcount;
    }
    Ok(total)
}
