pub mod aggregate;

pub use aggregate::{EstateRecord, Task};
