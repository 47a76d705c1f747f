//! Newsblend - An RSS News Aggregator
//!
//! This crate merges several RSS feeds into one cached, paginated stream
//! and suggests related articles based on what has been liked.
//! All state lives in memory and is lost on restart.

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod fetcher;
pub mod likes;
pub mod models;
pub mod routes;
pub mod service;
pub mod suggest;
pub mod views;
