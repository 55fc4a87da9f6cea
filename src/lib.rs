pub mod cache;
pub mod catalog;
pub mod config;
pub mod predict;
pub mod service;
pub mod web;
