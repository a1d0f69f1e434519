pub mod admin;
pub mod services;
pub mod slots;
pub mod visits;
