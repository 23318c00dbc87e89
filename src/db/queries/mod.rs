pub mod applications;
pub mod showcases;
pub mod tokens;
pub mod users;
