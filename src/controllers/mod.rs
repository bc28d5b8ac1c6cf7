pub mod boards;
pub mod columns;
pub mod subtasks;
pub mod tasks;
