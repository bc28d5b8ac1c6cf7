//! Kanban board service: boards, ordered columns, ordered tasks and subtasks
//! behind a JSON API.

pub mod config;
pub mod controllers;
pub mod db;
pub mod error;
pub mod reindex;
pub mod routes;
pub mod validation;
pub mod views;
