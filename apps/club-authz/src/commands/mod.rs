pub mod audit;
pub mod check;
pub mod roles;
