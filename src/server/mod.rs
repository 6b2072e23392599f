//! TCP listener: accepts connections and runs one connection task each.

pub mod listener;
