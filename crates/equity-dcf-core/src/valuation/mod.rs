pub mod dcf;
pub mod historical;
pub mod projection;
pub mod terminal;
pub mod wacc;
