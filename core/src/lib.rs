pub mod aggregate;
pub mod db;
pub mod health;
pub mod models;
pub mod planner;
pub mod seed;
pub mod token;
