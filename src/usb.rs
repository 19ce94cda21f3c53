//! USB Subsystem
//!
//! The operator console is a CDC ACM virtual serial port. Descriptor data
//! and packet framing live here; the class itself is built in `main`.

pub mod cdc;
