pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod http;
pub mod notes;
pub mod state;
