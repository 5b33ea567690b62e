//! Client for the cloud prediction backend
//!
//! Covers LSTM price prediction, news sentiment, technical indicators,
//! the market overview and the health probe.

pub mod client;
pub mod dto;

pub use client::CloudMlClient;
