pub mod health;
pub mod vitals;
