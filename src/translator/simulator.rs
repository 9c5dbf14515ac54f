//! Wire dialect of the TCS simulator
//!
//! Lower-case verbs with `key=value` arguments, e.g. `slew ra=10.5 dec=-20`.
//! The simulator has no autoguider, so `Autoguide` has no representation.
//! Replies are `done [values...]` or `fail <code> <message>`.

use super::{CommandTranslator, parse_status_reply, require_finite, require_word};
use crate::core::types::{Command, CommandResult};
use crate::error::{Error, Result};

/// Translator for the TCS simulator
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatorTranslator;

impl CommandTranslator for SimulatorTranslator {
    fn name(&self) -> &'static str {
        "simulator"
    }

    fn translate_command(&self, command: &Command) -> Result<Option<String>> {
        let text = match command {
            Command::Slew { ra_deg, dec_deg } => format!(
                "slew ra={} dec={}",
                require_finite("ra", *ra_deg)?,
                require_finite("dec", *dec_deg)?
            ),
            Command::Offset {
                ra_arcsec,
                dec_arcsec,
            } => format!(
                "offset dra={} ddec={}",
                require_finite("ra offset", *ra_arcsec)?,
                require_finite("dec offset", *dec_arcsec)?
            ),
            Command::Focus { position_mm } => {
                format!("focus pos={}", require_finite("focus", *position_mm)?)
            }
            Command::Autoguide { .. } => return Ok(None),
            Command::Rotator { angle_deg } => format!(
                "rotator angle={}",
                require_finite("rotator angle", *angle_deg)?
            ),
            Command::Instrument { name } => {
                format!("instrument name={}", require_word("instrument", name)?)
            }
            Command::Show { key } => {
                format!("show key={}", require_word("key", key)?.to_lowercase())
            }
            Command::Stop => "stop".to_string(),
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
        parse_status_reply(text, "done", &["fail"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_commands() {
        let slew = SimulatorTranslator
            .translate_command(&Command::Slew {
                ra_deg: 10.5,
                dec_deg: -20.0,
            })
            .unwrap();
        assert_eq!(slew.as_deref(), Some("slew ra=10.5 dec=-20"));

        let show = SimulatorTranslator
            .translate_command(&Command::Show { key: "AZIMUTH".into() })
            .unwrap();
        assert_eq!(show.as_deref(), Some("show key=azimuth"));
    }

    #[test]
    fn test_autoguide_has_no_representation() {
        let text = SimulatorTranslator
            .translate_command(&Command::Autoguide { enable: true })
            .unwrap();
        assert!(text.is_none());
    }

    #[test]
    fn test_replies() {
        let done = SimulatorTranslator.translate_response(&Command::Stop, "done 3");
        assert!(done.success);
        assert_eq!(done.values, vec!["3".to_string()]);

        let fail = SimulatorTranslator.translate_response(&Command::Stop, "fail 7 not homed");
        assert_eq!(fail, CommandResult::failed(7, "not homed"));
    }
}
