//! A personal search engine for a curated collection of web links: a
//! SQLite-backed store, BM25 lexical + cosine dense-vector + RRF hybrid
//! search, a headless-browser crawler, and a single-slot background job
//! runner, wrapped in a CLI and a JSON HTTP API.

pub mod cli;
pub mod config;
pub mod control;
pub mod crawler;
pub mod embedder;
pub mod jobs;
pub mod models;
pub mod search;
pub mod server;
pub mod store;
