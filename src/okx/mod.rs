//! OKX module - market data and portfolio access over the OKX REST API

pub mod auth;
pub mod client;
pub mod messages;
pub mod rest;

pub use client::OkxClient;
