//! Equipment sharing workflow: requests for custody, owner approval,
//! derived agreements and tracked physical transfers.

mod config;
mod db;
mod equipment;
mod notification;
mod rest_api;
mod service;
mod workflow;

pub mod testing;

pub use config::Config;
pub use equipment::{EquipmentDirectory, RegistryFile};
pub use notification::{LoggingSink, NotificationSink, SharingNotification};
pub use rest_api::SHARING_API_PATH;
pub use service::{SharingInitError, SharingService};

#[macro_use]
extern crate diesel;
