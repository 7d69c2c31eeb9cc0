pub mod adapter_manager;
pub mod hooks;

pub use adapter_manager::ObjectAdapterManager;
pub use hooks::LifecycleBridge;
