//! Storage layer for devices
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  DeviceHandle (per-open view)       │
//! │  - access mode, cursor              │
//! │  - append as write-time override    │
//! └─────────────────────────────────────┘
//!          ▲
//!          │ shares Arc<Device>
//!          ▼
//! ┌─────────────────────────────────────┐
//! │  Device (one storage unit)          │
//! │  - Mutex<Box<dyn StorageBackend>>   │
//! └─────────────────────────────────────┘
//!          ▲
//!          │ created/managed by
//!          ▼
//! ┌─────────────────────────────────────┐
//! │  DeviceRegistry (device table)      │
//! │  - names devices by path            │
//! │  - pluggable backends               │
//! └─────────────────────────────────────┘
//!          ▲
//!          │
//!      MemStorage (or any StorageBackend)
//! ```

pub mod buffer;
pub mod storage;

pub use buffer::MemStorage;
pub use storage::StorageBackend;
