pub mod json;
pub mod memory;

pub use json::JsonFileLedger;
pub use memory::MemoryLedger;
