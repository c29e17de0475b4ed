//! Streaming cursor
//!
//! A [`RowStream`] holds one pooled connection for its whole life. Rows are
//! decoded as they arrive instead of being buffered. The connection goes back
//! to the pool when the stream ends, yields an error, or is dropped.

use std::pin::Pin;
use std::task::{Context, Poll};

use async_stream::try_stream;
use futures::stream::{self, BoxStream, Stream, StreamExt, TryStreamExt};
use sqlx::pool::PoolConnection;
use sqlx::Postgres;
use type_mapping::{Record, SqlValue};

use crate::binding::{bind_all, decode_row};
use crate::errors::ExecutionError;

pub struct RowStream {
    inner: BoxStream<'static, Result<Record, ExecutionError>>,
    rows: u64,
    finished: bool,
}

impl RowStream {
    /// `sql` must already use numbered parameters
    pub(crate) fn open(conn: PoolConnection<Postgres>, sql: String, args: Vec<SqlValue>) -> Self {
        Self {
            inner: Box::pin(decode_rows(conn, sql, args)),
            rows: 0,
            finished: false,
        }
    }

    /// Rows yielded so far
    pub fn rows_read(&self) -> u64 {
        self.rows
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Stop reading and release the connection
    pub fn close(self) {
        drop(self);
    }

    /// Drop the cursor now so its connection returns to the pool even while
    /// the caller still holds the stream
    fn release(&mut self) {
        self.finished = true;
        self.inner = stream::empty().boxed();
    }
}

fn decode_rows(
    mut conn: PoolConnection<Postgres>,
    sql: String,
    args: Vec<SqlValue>,
) -> impl Stream<Item = Result<Record, ExecutionError>> + Send + 'static {
    try_stream! {
        let mut rows = bind_all(&sql, args).fetch(&mut *conn);
        while let Some(row) = rows.try_next().await? {
            yield decode_row(&row)?;
        }
    }
}

impl Stream for RowStream {
    type Item = Result<Record, ExecutionError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        match this.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(record))) => {
                this.rows += 1;
                Poll::Ready(Some(Ok(record)))
            }
            Poll::Ready(Some(Err(e))) => {
                this.release();
                tracing::debug!(rows = this.rows, error = %e, "row stream failed");
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.release();
                tracing::debug!(rows = this.rows, "row stream exhausted");
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for RowStream {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(rows = self.rows, "row stream closed early, releasing connection");
        }
    }
}
