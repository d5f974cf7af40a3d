mod device_selector;
mod logical_device;
mod physical_device;
mod queues;
mod vendor;

pub use logical_device::create_logical_device;
pub use physical_device::PhysicalDevice;
pub use queues::{QueueFamilies, Queues};
