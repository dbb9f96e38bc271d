//! Notification REST API access.
//!
//! `NotificationGateway` is the seam the rest of the engine talks
//! through; `HttpNotificationApi` is the reqwest-backed production
//! implementation. Tests swap in in-memory gateways.

mod gateway;
mod http;

pub use gateway::{ApiError, NotificationGateway, NotificationQuery};
pub use http::HttpNotificationApi;
