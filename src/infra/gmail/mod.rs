pub mod client;

pub use client::GmailClient;
