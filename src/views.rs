//! JSON shapes returned by the API.
//!
//! Rows are nested explicitly here; `status` and `progress` are computed on
//! read and never stored.

use std::collections::HashMap;

use serde::Serialize;

use crate::db::models::{Board, Column, Subtask, Task};

#[derive(Debug, Serialize)]
pub struct BoardView {
    #[serde(flatten)]
    pub board: Board,
    pub columns: Vec<ColumnView>,
}

#[derive(Debug, Serialize)]
pub struct ColumnView {
    #[serde(flatten)]
    pub column: Column,
    pub tasks: Vec<TaskView>,
}

#[derive(Debug, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub status: String,
    pub progress: u8,
    pub subtasks: Vec<Subtask>,
}

/// Percentage of completed subtasks, rounded half up. Zero without subtasks.
pub fn progress(subtasks: &[Subtask]) -> u8 {
    let total = subtasks.len();
    if total == 0 {
        return 0;
    }
    let completed = subtasks.iter().filter(|s| s.is_completed).count();
    ((completed * 200 + total) / (total * 2)) as u8
}

pub fn task_view(task: Task, status: &str, subtasks: Vec<Subtask>) -> TaskView {
    TaskView {
        progress: progress(&subtasks),
        status: status.to_string(),
        task,
        subtasks,
    }
}

fn group_by<T>(rows: Vec<T>, key: impl Fn(&T) -> &str) -> HashMap<String, Vec<T>> {
    let mut groups: HashMap<String, Vec<T>> = HashMap::new();
    for row in rows {
        groups.entry(key(&row).to_string()).or_default().push(row);
    }
    groups
}

/// Tasks of a single column, sorted by order, each with its subtasks.
pub fn column_tasks(column: &Column, mut tasks: Vec<Task>, subtasks: Vec<Subtask>) -> Vec<TaskView> {
    let mut subtasks = group_by(subtasks, |s| s.task_id.as_str());
    tasks.sort_by_key(|task| task.order);
    tasks
        .into_iter()
        .map(|task| {
            let children = subtasks.remove(&task.id).unwrap_or_default();
            task_view(task, &column.name, children)
        })
        .collect()
}

/// Nests flat row sets into board trees. Columns and tasks come out sorted
/// by order; boards keep the order they were given in.
pub fn assemble(
    boards: Vec<Board>,
    columns: Vec<Column>,
    tasks: Vec<Task>,
    subtasks: Vec<Subtask>,
) -> Vec<BoardView> {
    let mut columns = group_by(columns, |c| c.board_id.as_str());
    let mut tasks = group_by(tasks, |t| t.column_id.as_str());
    let mut subtasks = group_by(subtasks, |s| s.task_id.as_str());

    let mut views = Vec::with_capacity(boards.len());
    for board in boards {
        let mut board_columns = columns.remove(&board.id).unwrap_or_default();
        board_columns.sort_by_key(|column| column.order);

        let mut column_views = Vec::with_capacity(board_columns.len());
        for column in board_columns {
            let children = tasks.remove(&column.id).unwrap_or_default();
            let grandchildren = children
                .iter()
                .flat_map(|task| subtasks.remove(&task.id).unwrap_or_default())
                .collect();
            column_views.push(ColumnView {
                tasks: column_tasks(&column, children, grandchildren),
                column,
            });
        }

        views.push(BoardView {
            board,
            columns: column_views,
        });
    }
    views
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at() -> NaiveDateTime {
        chrono::DateTime::from_timestamp(1_700_000_000, 0)
            .unwrap()
            .naive_utc()
    }

    fn subtask(id: &str, task_id: &str, done: bool) -> Subtask {
        Subtask {
            id: id.to_string(),
            task_id: task_id.to_string(),
            title: id.to_string(),
            is_completed: done,
            created_at: at(),
            updated_at: at(),
        }
    }

    fn column(id: &str, board_id: &str, name: &str, order: i32) -> Column {
        Column {
            id: id.to_string(),
            board_id: board_id.to_string(),
            name: name.to_string(),
            order,
            created_at: at(),
            updated_at: at(),
        }
    }

    fn task(id: &str, column_id: &str, order: i32) -> Task {
        Task {
            id: id.to_string(),
            column_id: column_id.to_string(),
            title: id.to_string(),
            description: None,
            order,
            created_at: at(),
            updated_at: at(),
        }
    }

    #[test]
    fn test_progress_without_subtasks_is_zero() {
        assert_eq!(progress(&[]), 0);
    }

    #[test]
    fn test_progress_rounds_to_nearest() {
        let third = vec![
            subtask("a", "t", true),
            subtask("b", "t", false),
            subtask("c", "t", false),
        ];
        assert_eq!(progress(&third), 33);

        let two_thirds = vec![
            subtask("a", "t", true),
            subtask("b", "t", true),
            subtask("c", "t", false),
        ];
        assert_eq!(progress(&two_thirds), 67);

        let eighth: Vec<Subtask> = (0..8)
            .map(|i| subtask(&i.to_string(), "t", i == 0))
            .collect();
        assert_eq!(progress(&eighth), 13);

        assert_eq!(progress(&[subtask("a", "t", true)]), 100);
    }

    #[test]
    fn test_assemble_nests_and_sorts() {
        let board = Board {
            id: "b".to_string(),
            name: "Board".to_string(),
            created_at: at(),
            updated_at: at(),
        };
        let columns = vec![column("c2", "b", "Done", 1), column("c1", "b", "Todo", 0)];
        let tasks = vec![task("t2", "c1", 1), task("t1", "c1", 0), task("t3", "c2", 0)];
        let subtasks = vec![subtask("s1", "t1", true), subtask("s2", "t1", false)];

        let views = assemble(vec![board], columns, tasks, subtasks);

        assert_eq!(views.len(), 1);
        let columns = &views[0].columns;
        assert_eq!(columns[0].column.id, "c1");
        assert_eq!(columns[1].column.id, "c2");
        assert_eq!(columns[0].tasks[0].task.id, "t1");
        assert_eq!(columns[0].tasks[1].task.id, "t2");
        assert_eq!(columns[0].tasks[0].status, "Todo");
        assert_eq!(columns[0].tasks[0].progress, 50);
        assert_eq!(columns[0].tasks[0].subtasks.len(), 2);
        assert_eq!(columns[1].tasks[0].status, "Done");
        assert!(columns[1].tasks[0].subtasks.is_empty());
    }

    #[test]
    fn test_task_view_serializes_flat() {
        let view = task_view(task("t1", "c1", 0), "Doing", vec![]);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], "t1");
        assert_eq!(json["order"], 0);
        assert_eq!(json["status"], "Doing");
        assert_eq!(json["progress"], 0);
        assert!(json["description"].is_null());
        assert!(json["subtasks"].as_array().unwrap().is_empty());
    }
}
