pub mod auth;
pub mod clock;
pub mod customers;
pub mod identity;
pub mod password;
pub mod refresh;
pub mod restaurants;
pub mod secret;
pub mod token;
