//! Abstract commands and results exchanged with upstream callers
//!
//! - [`Command`]: domain command to proxy to the TCS (JSON tagged by `type`)
//! - [`CommandResult`]: final outcome delivered back to the caller
//! - [`codes`]: reserved result codes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved result codes
pub mod codes {
    /// Success
    pub const OK: i32 = 0;
    /// Command or reply could not be translated
    pub const TRANSLATION_FAILED: i32 = 700_001;
    /// Datagram could not be sent
    pub const TRANSMIT_FAILED: i32 = 700_002;
    /// Far end rejected the command without a code of its own
    pub const FAR_END_ERROR: i32 = 700_003;
    /// Caller gave up waiting before the far end replied
    pub const LOCAL_TIMEOUT: i32 = 700_004;
    /// Far end reported a protocol-level timeout (`<<090` marker)
    pub const FAR_END_TIMEOUT: i32 = 700_090;
}

/// Commands proxied to the telescope control system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Slew to equatorial coordinates (degrees)
    Slew { ra_deg: f64, dec_deg: f64 },
    /// Small offset from the current position (arcseconds)
    Offset { ra_arcsec: f64, dec_arcsec: f64 },
    /// Move the secondary mirror focus (mm)
    Focus { position_mm: f64 },
    /// Switch the autoguider on or off
    Autoguide { enable: bool },
    /// Set the rotator sky position angle (degrees)
    Rotator { angle_deg: f64 },
    /// Select the instrument in the focal plane
    Instrument { name: String },
    /// Query a status value
    Show { key: String },
    /// Stop all axes
    Stop,
    /// Pass pre-rendered wire text through untouched
    Raw { text: String },
}

impl Command {
    /// Upper-case type key, used to look up per-command timeouts
    pub fn type_name(&self) -> &'static str {
        match self {
            Command::Slew { .. } => "SLEW",
            Command::Offset { .. } => "OFFSET",
            Command::Focus { .. } => "FOCUS",
            Command::Autoguide { .. } => "AUTOGUIDE",
            Command::Rotator { .. } => "ROTATOR",
            Command::Instrument { .. } => "INSTRUMENT",
            Command::Show { .. } => "SHOW",
            Command::Stop => "STOP",
            Command::Raw { .. } => "RAW",
        }
    }
}

/// Final outcome of one proxied command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    /// 0 on success
    pub code: i32,
    /// Human-readable error text (empty on success)
    pub message: String,
    /// Reply tokens following the status word
    #[serde(default)]
    pub values: Vec<String>,
}

impl CommandResult {
    pub fn ok(values: Vec<String>) -> Self {
        Self {
            success: true,
            code: codes::OK,
            message: String::new(),
            values,
        }
    }

    pub fn failed(code: i32, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code,
            message: message.into(),
            values: Vec::new(),
        }
    }

    /// Numeric reply values; tokens that are not numbers are skipped
    pub fn numeric_values(&self) -> Vec<f64> {
        self.values
            .iter()
            .filter_map(|v| v.parse::<f64>().ok())
            .collect()
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            write!(f, "OK")?;
            for v in &self.values {
                write!(f, " {}", v)?;
            }
            Ok(())
        } else {
            write!(f, "FAILED [{}] {}", self.code, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_json_tagging() {
        let cmd: Command = serde_json::from_str(r#"{"type":"Slew","ra_deg":10.5,"dec_deg":-20.0}"#)
            .unwrap();
        assert_eq!(
            cmd,
            Command::Slew {
                ra_deg: 10.5,
                dec_deg: -20.0
            }
        );
        assert_eq!(cmd.type_name(), "SLEW");

        let stop: Command = serde_json::from_str(r#"{"type":"Stop"}"#).unwrap();
        assert_eq!(stop, Command::Stop);
    }

    #[test]
    fn test_numeric_values() {
        let result = CommandResult::ok(vec!["1.0".into(), "TRACKING".into(), "2.5".into()]);
        assert_eq!(result.numeric_values(), vec![1.0, 2.5]);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            CommandResult::ok(vec!["1".into(), "2".into()]).to_string(),
            "OK 1 2"
        );
        assert_eq!(
            CommandResult::failed(codes::TRANSMIT_FAILED, "socket closed").to_string(),
            "FAILED [700002] socket closed"
        );
    }
}
