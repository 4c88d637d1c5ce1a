//! # fbmirror: Android screen mirror
//!
//! Command-line front end for `fbmirror-core`: loads the TOML config,
//! drives the engine against a real device through `adb`, turns console
//! lines into input and reports frame statistics.

pub mod config;
pub mod console;
pub mod sink;
