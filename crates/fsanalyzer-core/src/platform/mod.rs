/// Platform glue: owner lookup and host information.
pub mod owner;
pub mod system;

pub use owner::owner_name;
pub use system::{available_parallelism, log_system_info, memory_info, MemoryInfo};
