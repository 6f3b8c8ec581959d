//! Task Manager Library
//!
//! Role-based task tracking: admins create, assign, filter and report on tasks;
//! users update the status of tasks assigned to them. This module exports the
//! core components for testing and integration.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod types;
pub mod web;
