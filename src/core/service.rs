pub mod mkdir;
pub mod mover;
