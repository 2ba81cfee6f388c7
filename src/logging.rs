// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! src/logging.rs
//!
//! Logging setup using `tracing` and `tracing-subscriber`
//!
//! The engine only emits events; the binary decides where they go.
//!
//! # Log Levels
//!
//! - `error`/`warn`: blocked exports, unreadable input
//! - `info`: loaded definitions
//! - `debug`: applied, undone and redone commands, validation summaries
//! - `trace`: individual leaf writes
//!
//! `RUST_LOG` overrides the level chosen on the command line.

use clap::ValueEnum;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Level names accepted by `--debug`
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum LogLevel {
    #[value(name = "DEBUG", alias = "debug")]
    Debug,
    #[value(name = "INFO", alias = "info")]
    Info,
    #[default]
    #[value(name = "WARNING", aliases = ["warning", "warn"])]
    Warning,
    #[value(name = "ERROR", alias = "error")]
    Error,
}

impl LogLevel {
    pub fn as_level(self) -> Level {
        match self {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warning => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Filter for our crate at `level`, other crates at warn
pub fn build_env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.as_level().as_str().to_lowercase();
        EnvFilter::new(format!("warn,event_mask_selector={level},event_selector={level}"))
    })
}

/// Installs the global subscriber, writing to stderr
///
/// Fails if a subscriber is already installed.
pub fn init(level: LogLevel) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
}
