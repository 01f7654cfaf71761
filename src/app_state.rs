use crate::cli::CommandLineArgs;
use crate::resource_manager::ResourceManager;
use crate::store::MemoryStore;

use std::sync::Arc;

/// Shared application state passed to each request handler.
pub struct AppState {
    /// Command line arguments.
    pub args: CommandLineArgs,

    /// Resource manager.
    pub resource_manager: ResourceManager,

    /// Series store.
    pub store: MemoryStore,
}

impl AppState {
    /// Create and return an [AppState].
    pub fn new(args: &CommandLineArgs) -> Self {
        let memory_limit = args.memory_limit.as_ref().map(|limit| {
            byte_unit::Byte::parse_str(limit, /* ignore case */ true)
                .expect("invalid memory limit")
                .as_u64() as usize
        });
        let task_limit = args.thread_limit.or_else(|| Some(num_cpus::get() - 1));
        let resource_manager = ResourceManager::new(memory_limit, task_limit);

        Self {
            args: args.clone(),
            resource_manager,
            store: MemoryStore::new(),
        }
    }
}

/// AppState wrapped in an Atomic Reference Count (Arc) to allow multiple references.
pub type SharedAppState = Arc<AppState>;
