//! Rust client for the Waitlist API.

pub mod client;

pub use client::{
    PageView, PageViewReceipt, SubscribeOutcome, SubscribeRequest, WaitlistClient,
};
