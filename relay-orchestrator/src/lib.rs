pub mod api;
pub mod config;
pub mod db;
pub mod dispatcher;
pub mod repository;
pub mod service;
