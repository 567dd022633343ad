pub mod sensitivity;
pub mod stress;
