pub mod applications;
pub mod dashboard;
pub mod showcase;
pub mod users;
