#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

pub mod app;
pub mod encoding;
pub mod service;

#[cfg(feature = "std")]
pub mod catalog;
#[cfg(feature = "std")]
pub mod device;
#[cfg(feature = "std")]
pub mod error;
#[cfg(feature = "std")]
pub mod transport;

#[cfg(feature = "std")]
pub use error::ClientError;
pub use service::{ObjectIdentifier, ObjectType, PropertyDescriptor, PropertyIdentifier, PropertyValue, WriteType};
#[cfg(feature = "std")]
pub use transport::{BacnetIpTransport, ClientConfig, Tracer};

#[cfg(feature = "std")]
extern crate std;

#[cfg(not(feature = "std"))]
extern crate alloc;
