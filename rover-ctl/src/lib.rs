//! # rover-ctl — Headless Rover Control Client
//!
//! Connects to the robot over the rover-link protocol, runs the frame
//! loops, prints telemetry and link statistics, and transmits drive
//! commands at a fixed rate. It stands in for the GUI application and
//! exercises every collaborator interface of `rover-link` without
//! rendering anything.

pub mod config;
