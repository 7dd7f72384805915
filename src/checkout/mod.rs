pub mod holds;
pub mod payload;
pub mod session;
pub mod steps;
