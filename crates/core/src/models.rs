pub mod principal;
pub mod service;
pub mod slot;
