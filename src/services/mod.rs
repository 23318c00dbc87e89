pub mod analytics;
pub mod keygen;
