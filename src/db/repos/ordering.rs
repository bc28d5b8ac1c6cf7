//! Applies `reindex` plans to sibling rows.
//!
//! Every function here expects to run inside a transaction opened by the
//! caller (`SqliteConnection::immediate_transaction`), so the sibling reads and
//! the range updates see one consistent snapshot and are rolled back together.

use diesel::{prelude::*, update, SqliteConnection};
use tracing::{debug, error};

use crate::{
    db::{
        models::now,
        schema::{board_columns, tasks},
    },
    error::ApiError,
    reindex::{self, Shift},
};

/// Storage operations for one kind of ordered child row.
pub trait SiblingGroup {
    /// Name used in log lines.
    const KIND: &'static str;

    fn count(conn: &mut SqliteConnection, parent_id: &str) -> QueryResult<usize>;

    /// `(id, order)` of every sibling, sorted by order.
    fn orders(conn: &mut SqliteConnection, parent_id: &str) -> QueryResult<Vec<(String, i32)>>;

    /// Adds `shift.delta` to the siblings covered by `shift`, skipping `exclude_id`.
    fn shift(
        conn: &mut SqliteConnection,
        parent_id: &str,
        shift: Shift,
        exclude_id: &str,
    ) -> QueryResult<usize>;

    /// Writes the final parent and order of one row.
    fn place(
        conn: &mut SqliteConnection,
        id: &str,
        parent_id: &str,
        order: i32,
    ) -> QueryResult<usize>;
}

/// Columns of one board.
pub struct BoardColumns;

impl SiblingGroup for BoardColumns {
    const KIND: &'static str = "column";

    fn count(conn: &mut SqliteConnection, board_id: &str) -> QueryResult<usize> {
        let count: i64 = board_columns::table
            .filter(board_columns::board_id.eq(board_id))
            .count()
            .get_result(conn)?;
        Ok(count as usize)
    }

    fn orders(conn: &mut SqliteConnection, board_id: &str) -> QueryResult<Vec<(String, i32)>> {
        board_columns::table
            .filter(board_columns::board_id.eq(board_id))
            .order((board_columns::order.asc(), board_columns::id.asc()))
            .select((board_columns::id, board_columns::order))
            .load(conn)
    }

    fn shift(
        conn: &mut SqliteConnection,
        board_id: &str,
        shift: Shift,
        exclude_id: &str,
    ) -> QueryResult<usize> {
        update(
            board_columns::table
                .filter(board_columns::board_id.eq(board_id))
                .filter(board_columns::order.between(shift.from, shift.to))
                .filter(board_columns::id.ne(exclude_id)),
        )
        .set(board_columns::order.eq(board_columns::order + shift.delta))
        .execute(conn)
    }

    fn place(
        conn: &mut SqliteConnection,
        id: &str,
        board_id: &str,
        order: i32,
    ) -> QueryResult<usize> {
        update(board_columns::table.find(id))
            .set((
                board_columns::board_id.eq(board_id),
                board_columns::order.eq(order),
                board_columns::updated_at.eq(now()),
            ))
            .execute(conn)
    }
}

/// Tasks of one column.
pub struct ColumnTasks;

impl SiblingGroup for ColumnTasks {
    const KIND: &'static str = "task";

    fn count(conn: &mut SqliteConnection, column_id: &str) -> QueryResult<usize> {
        let count: i64 = tasks::table
            .filter(tasks::column_id.eq(column_id))
            .count()
            .get_result(conn)?;
        Ok(count as usize)
    }

    fn orders(conn: &mut SqliteConnection, column_id: &str) -> QueryResult<Vec<(String, i32)>> {
        tasks::table
            .filter(tasks::column_id.eq(column_id))
            .order((tasks::order.asc(), tasks::id.asc()))
            .select((tasks::id, tasks::order))
            .load(conn)
    }

    fn shift(
        conn: &mut SqliteConnection,
        column_id: &str,
        shift: Shift,
        exclude_id: &str,
    ) -> QueryResult<usize> {
        update(
            tasks::table
                .filter(tasks::column_id.eq(column_id))
                .filter(tasks::order.between(shift.from, shift.to))
                .filter(tasks::id.ne(exclude_id)),
        )
        .set(tasks::order.eq(tasks::order + shift.delta))
        .execute(conn)
    }

    fn place(
        conn: &mut SqliteConnection,
        id: &str,
        column_id: &str,
        order: i32,
    ) -> QueryResult<usize> {
        update(tasks::table.find(id))
            .set((
                tasks::column_id.eq(column_id),
                tasks::order.eq(order),
                tasks::updated_at.eq(now()),
            ))
            .execute(conn)
    }
}

/// Order for a row about to be appended under `parent_id`.
pub fn next_order<G: SiblingGroup>(
    conn: &mut SqliteConnection,
    parent_id: &str,
) -> Result<i32, ApiError> {
    Ok(reindex::append_order(G::count(conn, parent_id)?))
}

/// Moves row `id` from `old` to `requested` among its current siblings.
pub fn reorder<G: SiblingGroup>(
    conn: &mut SqliteConnection,
    parent_id: &str,
    id: &str,
    old: i32,
    requested: i64,
) -> Result<i32, ApiError> {
    let count = G::count(conn, parent_id)?;
    let plan = reindex::plan_reorder(old, requested, count)?;

    if let Some(shift) = plan.shift {
        let moved = G::shift(conn, parent_id, shift, id)?;
        debug!(
            "Reordered {} {} from {} to {} ({} siblings shifted by {})",
            G::KIND,
            id,
            old,
            plan.order,
            moved,
            shift.delta
        );
    }
    G::place(conn, id, parent_id, plan.order)?;
    verify::<G>(conn, parent_id)?;
    Ok(plan.order)
}

/// Moves row `id` from `source_id` to `destination_id`, closing the gap it
/// leaves and opening a slot at `requested` (or the end).
pub fn transfer<G: SiblingGroup>(
    conn: &mut SqliteConnection,
    id: &str,
    source_id: &str,
    old: i32,
    destination_id: &str,
    requested: Option<i64>,
) -> Result<i32, ApiError> {
    if source_id == destination_id {
        let requested = match requested {
            Some(requested) => requested,
            None => G::count(conn, source_id)? as i64 - 1,
        };
        return reorder::<G>(conn, source_id, id, old, requested);
    }

    let source_count = G::count(conn, source_id)?;
    let destination_count = G::count(conn, destination_id)?;
    let plan = reindex::plan_transfer(old, source_count, requested, destination_count)?;

    if let Some(shift) = plan.source {
        G::shift(conn, source_id, shift, id)?;
    }
    if let Some(shift) = plan.destination {
        G::shift(conn, destination_id, shift, id)?;
    }
    G::place(conn, id, destination_id, plan.order)?;
    debug!(
        "Moved {} {} from {}[{}] to {}[{}]",
        G::KIND,
        id,
        source_id,
        old,
        destination_id,
        plan.order
    );

    verify::<G>(conn, source_id)?;
    verify::<G>(conn, destination_id)?;
    Ok(plan.order)
}

/// Re-enumerates the siblings under `parent_id` as `0..n` after a deletion.
pub fn compact<G: SiblingGroup>(
    conn: &mut SqliteConnection,
    parent_id: &str,
) -> Result<(), ApiError> {
    let siblings = G::orders(conn, parent_id)?;
    let changes = reindex::compact(&siblings);
    for (id, order) in &changes {
        G::place(conn, id, parent_id, *order)?;
    }
    if !changes.is_empty() {
        debug!("Compacted {} {} rows under {}", changes.len(), G::KIND, parent_id);
    }
    verify::<G>(conn, parent_id)
}

/// Fails with a consistency error unless the siblings under `parent_id` are dense.
pub fn verify<G: SiblingGroup>(
    conn: &mut SqliteConnection,
    parent_id: &str,
) -> Result<(), ApiError> {
    let orders = G::orders(conn, parent_id)?;
    reindex::check_dense(orders.into_iter().map(|(_, order)| order)).map_err(|err| {
        error!("{} ordering under {} is broken: {}", G::KIND, parent_id, err);
        ApiError::Consistency(err)
    })
}
