//! Quality Gate Module
//!
//! Every translation passes through the gate before it counts as done. The
//! gate is a pure decision function over the translated text's metrics:
//! identical input always yields the identical verdict and reasons, which is
//! what lets two workers racing on a reclaimed job reach the same
//! conclusion independently.

pub mod gate;

#[cfg(test)]
mod tests;
