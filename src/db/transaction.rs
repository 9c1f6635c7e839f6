use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::error::{Result, StoreContext};

/// Run `operation` inside an IMMEDIATE transaction. The transaction commits
/// when the closure succeeds; any error drops it, which rolls back.
pub fn in_transaction<F, T>(conn: &mut Connection, operation: F) -> Result<T>
where
    F: FnOnce(&Transaction) -> Result<T>,
{
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .store_context("failed to begin transaction")?;

    let value = operation(&tx)?;
    tx.commit().store_context("failed to commit transaction")?;
    Ok(value)
}
