pub mod application;
pub mod showcase;
pub mod token;
pub mod user;
