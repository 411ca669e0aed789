pub mod database;
pub mod outcome_repository;
