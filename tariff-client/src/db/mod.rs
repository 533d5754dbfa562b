pub mod memory;
pub mod reader;
pub mod village_queries;

pub use memory::MemoryTableReader;
pub use reader::{PgTableReader, Table, TableReader};
