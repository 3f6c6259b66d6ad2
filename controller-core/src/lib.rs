#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;

// Shared logic for the traffic signal controller.
//
// This crate stays portable across MCU firmware and host tooling by avoiding the
// Rust standard library and exposing abstractions the other crates can adopt.

pub mod config;
pub mod console;
pub mod controller;
pub mod debounce;
pub mod lights;
pub mod mode;
pub mod pedestrian;
pub mod rate;
pub mod runtime;
pub mod scheduler;
pub mod sequencer;
pub mod status;
pub mod telemetry;
