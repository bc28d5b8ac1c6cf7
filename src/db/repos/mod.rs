pub mod board;
pub mod column;
pub mod ordering;
pub mod subtask;
pub mod task;
