pub mod caster;
pub mod client;
pub mod connection;
pub mod no_rows;
pub mod runner;
pub mod table;
pub mod types;
