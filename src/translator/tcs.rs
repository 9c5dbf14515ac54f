//! Wire dialect of the real telescope control system
//!
//! | Command | Wire text |
//! |---------|-----------|
//! | `Slew` | `SLEW <ra_deg> <dec_deg>` |
//! | `Offset` | `OFFSET <ra_arcsec> <dec_arcsec>` |
//! | `Focus` | `FOCUS <mm>` |
//! | `Autoguide` | `AUTOGUIDE ON` / `AUTOGUIDE OFF` |
//! | `Rotator` | `ROTATOR <deg>` |
//! | `Instrument` | `INSTRUMENT <name>` |
//! | `Show` | `SHOW <key>` |
//! | `Stop` | `STOP` |
//!
//! Replies are `OK [values...]` or `ERR <code> <message>`.

use super::{CommandTranslator, parse_status_reply, require_finite, require_word};
use crate::core::types::{Command, CommandResult};
use crate::error::{Error, Result};

/// Translator for the real TCS
#[derive(Debug, Clone, Copy, Default)]
pub struct TcsTranslator;

impl CommandTranslator for TcsTranslator {
    fn name(&self) -> &'static str {
        "tcs"
    }

    fn translate_command(&self, command: &Command) -> Result<Option<String>> {
        let text = match command {
            Command::Slew { ra_deg, dec_deg } => {
                let ra = require_finite("ra", *ra_deg)?.rem_euclid(360.0);
                let dec = require_finite("dec", *dec_deg)?;
                if !(-90.0..=90.0).contains(&dec) {
                    return Err(Error::Translation(format!("dec out of range: {}", dec)));
                }
                format!("SLEW {:.6} {:.6}", ra, dec)
            }
            Command::Offset {
                ra_arcsec,
                dec_arcsec,
            } => format!(
                "OFFSET {:.3} {:.3}",
                require_finite("ra offset", *ra_arcsec)?,
                require_finite("dec offset", *dec_arcsec)?
            ),
            Command::Focus { position_mm } => {
                format!("FOCUS {:.4}", require_finite("focus", *position_mm)?)
            }
            Command::Autoguide { enable } => {
                format!("AUTOGUIDE {}", if *enable { "ON" } else { "OFF" })
            }
            Command::Rotator { angle_deg } => format!(
                "ROTATOR {:.4}",
                require_finite("rotator angle", *angle_deg)?
            ),
            Command::Instrument { name } => {
                format!("INSTRUMENT {}", require_word("instrument", name)?)
            }
            Command::Show { key } => format!("SHOW {}", require_word("key", key)?.to_uppercase()),
            Command::Stop => "STOP".to_string(),
            Command::Raw { text } => {
                if text.trim().is_empty() {
                    return Err(Error::Translation("raw command text is empty".to_string()));
                }
                text.clone()
            }
        };
        Ok(Some(text))
    }

    fn translate_response(&self, _command: &Command, text: &str) -> CommandResult {
        parse_status_reply(text, "OK", &["ERR", "ERROR"])
    }
}
