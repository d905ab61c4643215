pub mod http;
pub mod request;
pub mod sqlite;
