pub mod config;
pub mod models;
pub mod db;
pub mod catalog;
pub mod ingest;
