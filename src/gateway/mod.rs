pub mod client;

pub use client::HttpNotificationGateway;
