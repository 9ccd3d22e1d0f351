#![forbid(unsafe_code)]

pub mod kv_repo;
pub mod question_source;
pub mod repository;
pub mod sqlite;
