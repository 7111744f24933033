pub mod gateway;
pub mod memory_store;
pub mod shared;
pub mod store;

pub use gateway::MutationGateway;
pub use memory_store::MemoryStore;
pub use shared::SharedTree;
pub use store::DocumentStore;
