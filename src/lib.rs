pub mod cache;
pub mod consts;
pub mod engine;
pub mod error;
pub mod imaging;
pub mod server;
pub mod upload;
