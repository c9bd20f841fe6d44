pub mod dependencies;
pub mod files;
pub mod pci;
pub mod process;
