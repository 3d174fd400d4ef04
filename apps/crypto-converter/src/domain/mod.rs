//! Domain layer - Core quote types and decimal arithmetic.

pub mod quote;
