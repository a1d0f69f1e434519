pub mod admin;
pub mod health;
pub mod services;
pub mod slots;
pub mod visits;
