pub mod config;
pub mod engine;
pub mod web;

mod integration_tests;
