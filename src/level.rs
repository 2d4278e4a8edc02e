// Copyright 2024 FastLabs Developers
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

use std::fmt;
use std::str::FromStr;

/// Severity of a [`LogEntry`](crate::LogEntry), ordered from least to most important.
///
/// Levels compare by severity, so `LogLevel::Debug < LogLevel::Warning` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// The lowest level of logging. Deep step-by-step traces that are rarely
    /// useful outside of close debugging sessions.
    Verbose,
    /// Messages that are not needed at runtime but help when finding out why
    /// something is happening.
    Debug,
    /// The baseline level. Events and interactions that describe what the
    /// application is doing.
    Info,
    /// Something that is not breaking yet but behaves in an undesired way.
    Warning,
    /// Issues that broke the application and need to be fixed.
    Error,
}

impl LogLevel {
    /// The upper-case name of the level, as rendered in console output.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Verbose => "VERBOSE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "VERBOSE" => Ok(LogLevel::Verbose),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(anyhow::anyhow!("unknown log level: {s}")),
        }
    }
}
