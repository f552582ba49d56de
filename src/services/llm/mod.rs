pub mod client;

pub use client::OllamaEngine;
