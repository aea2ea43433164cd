// ABOUTME: Library root for wb-tracker
// ABOUTME: Sync engine, backend client, catalog helpers, configuration and CLI commands

pub mod api;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod feeds;
pub mod sync;
