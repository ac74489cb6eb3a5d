pub mod auth;
pub mod customer;
pub mod refresh;
pub mod restaurant;
