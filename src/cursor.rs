//! The Cursor Facade (§4.6): the public surface over the Execution
//! Adapter, enforcing the preconditions that must never even enter the
//! rewrite/execute pipeline.

use crate::conn_context::ConnContext;
use crate::error::Error;
use crate::execution::{self, Transport};
use crate::mogrify;
use crate::vars::Vars;

/// Opaque marker binding a named cursor to a transaction (§4.6). The
/// transaction subsystem itself is out of scope (§1); this core only
/// needs to know whether one has been bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionMark(u64);

impl TransactionMark {
    pub const fn new(id: u64) -> Self {
        TransactionMark(id)
    }
}

pub struct Cursor<T: Transport> {
    transport: T,
    ctx: ConnContext,
    name: Option<String>,
    closed: bool,
    async_in_flight: bool,
    two_phase_pending: bool,
    transaction_mark: Option<TransactionMark>,
    executed_once: bool,
    last_query: Option<String>,
}

impl<T: Transport> Cursor<T> {
    pub fn new(transport: T, ctx: ConnContext) -> Self {
        Cursor {
            transport,
            ctx,
            name: None,
            closed: false,
            async_in_flight: false,
            two_phase_pending: false,
            transaction_mark: None,
            executed_once: false,
            last_query: None,
        }
    }

    pub fn named(transport: T, ctx: ConnContext, name: impl Into<String>) -> Self {
        Cursor { name: Some(name.into()), ..Cursor::new(transport, ctx) }
    }

    pub fn bind_transaction(&mut self, mark: TransactionMark) {
        self.transaction_mark = Some(mark);
    }

    pub fn begin_two_phase(&mut self) {
        self.two_phase_pending = true;
    }

    pub fn end_two_phase(&mut self) {
        self.two_phase_pending = false;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    /// Idempotent: closing an already-closed cursor is a no-op (§4.2's
    /// `free_all` idempotence policy extended to the facade).
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub async fn execute(&mut self, sql: &str, vars: &Vars, async_flag: bool) -> Result<u64, Error> {
        self.check_general_preconditions()?;
        self.check_named_cursor_preconditions()?;

        self.async_in_flight = true;
        let result = execution::execute(
            &mut self.transport,
            sql,
            vars,
            self.name.as_deref(),
            &self.ctx,
            async_flag,
        )
        .await;
        self.async_in_flight = false;

        let outcome = result?;
        if self.name.is_some() {
            self.executed_once = true;
        }
        self.last_query = Some(outcome.last_query);
        Ok(outcome.rowcount)
    }

    pub async fn executemany(&mut self, sql: &str, vars_list: &[Vars], async_flag: bool) -> Result<u64, Error> {
        self.check_general_preconditions()?;
        if self.name.is_some() {
            return Err(Error::programming("executemany is not supported on a named cursor"));
        }

        self.async_in_flight = true;
        let result = execution::execute_many(&mut self.transport, sql, vars_list, &self.ctx, async_flag).await;
        self.async_in_flight = false;
        result
    }

    pub fn mogrify(&self, sql: &str, vars: &Vars) -> Result<String, Error> {
        self.check_general_preconditions()?;
        mogrify::mogrify(sql, vars, &self.ctx)
    }

    fn check_general_preconditions(&self) -> Result<(), Error> {
        if self.closed {
            return Err(Error::programming("cursor is closed"));
        }
        if self.async_in_flight {
            return Err(Error::programming(
                "an asynchronous operation is already in flight on this connection",
            ));
        }
        if self.two_phase_pending {
            return Err(Error::programming(
                "a two-phase-commit transaction is pending on this connection",
            ));
        }
        Ok(())
    }

    fn check_named_cursor_preconditions(&self) -> Result<(), Error> {
        if self.name.is_some() {
            if self.transaction_mark.is_none() {
                return Err(Error::programming(
                    "a named cursor must be bound to a transaction before it can execute",
                ));
            }
            if self.executed_once {
                return Err(Error::programming("a named cursor may only be executed once"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures_core::future::BoxFuture;

    use super::*;
    use crate::param_buffer::ParameterBuffer;
    use crate::value::Value;

    #[derive(Default)]
    struct FakeTransport;

    impl Transport for FakeTransport {
        fn send_simple<'t>(&'t mut self, _sql: &'t str, _async_flag: bool) -> BoxFuture<'t, Result<u64, Error>> {
            Box::pin(async { Ok(0) })
        }

        fn send_typed<'t>(
            &'t mut self,
            _sql: &'t str,
            _params: &'t ParameterBuffer,
            _async_flag: bool,
        ) -> BoxFuture<'t, Result<u64, Error>> {
            Box::pin(async { Ok(1) })
        }
    }

    #[tokio::test]
    async fn execute_after_close_is_a_programming_error() {
        let mut cursor = Cursor::new(FakeTransport, ConnContext::default());
        cursor.close();
        let err = cursor.execute("SELECT 1", &Vars::None, false).await.unwrap_err();
        assert!(matches!(err, Error::Programming(_)));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let mut cursor = Cursor::new(FakeTransport, ConnContext::default());
        cursor.close();
        cursor.close();
        assert!(cursor.is_closed());
    }

    #[tokio::test]
    async fn named_cursor_without_a_transaction_mark_is_a_programming_error() {
        let mut cursor = Cursor::named(FakeTransport, ConnContext::default(), "c1");
        let err = cursor.execute("SELECT 1", &Vars::None, false).await.unwrap_err();
        assert!(matches!(err, Error::Programming(_)));
    }

    #[tokio::test]
    async fn named_cursor_can_only_execute_once() {
        let mut cursor = Cursor::named(FakeTransport, ConnContext::default(), "c1");
        cursor.bind_transaction(TransactionMark::new(1));
        cursor.execute("SELECT 1", &Vars::None, false).await.unwrap();
        let err = cursor.execute("SELECT 1", &Vars::None, false).await.unwrap_err();
        assert!(matches!(err, Error::Programming(_)));
    }

    #[tokio::test]
    async fn executemany_is_not_supported_on_a_named_cursor() {
        let mut cursor = Cursor::named(FakeTransport, ConnContext::default(), "c1");
        cursor.bind_transaction(TransactionMark::new(1));
        let err = cursor
            .executemany("INSERT INTO t VALUES (%s)", &[Vars::Positional(vec![Value::Int4(1)])], false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Programming(_)));
    }

    #[tokio::test]
    async fn execute_records_the_last_query() {
        let mut cursor = Cursor::new(FakeTransport, ConnContext::default());
        cursor.execute("SELECT 1", &Vars::None, false).await.unwrap();
        assert_eq!(cursor.last_query(), Some("SELECT 1"));
    }

    #[test]
    fn mogrify_after_close_is_a_programming_error() {
        let mut cursor = Cursor::new(FakeTransport, ConnContext::default());
        cursor.close();
        let err = cursor.mogrify("SELECT %s", &Vars::Positional(vec![Value::Int4(1)])).unwrap_err();
        assert!(matches!(err, Error::Programming(_)));
    }
}
