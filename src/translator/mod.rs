//! Command translation between abstract commands and wire text
//!
//! The proxy core depends only on [`CommandTranslator`]. The wire dialect
//! differs between the real TCS and its simulator; which one is used is
//! decided once at startup by [`create_translator`].

mod simulator;
mod tcs;

pub use simulator::SimulatorTranslator;
pub use tcs::TcsTranslator;

use crate::core::types::{Command, CommandResult, codes};
use crate::error::{Error, Result};
use std::sync::Arc;

/// Reply prefix the far end uses to report a protocol-level timeout
pub const TIMEOUT_MARKER: &str = "<<090";

/// Pluggable translation capability
pub trait CommandTranslator: Send + Sync {
    /// Dialect name for logging
    fn name(&self) -> &'static str;

    /// Render a command as wire text
    ///
    /// `Ok(None)` means the command has no representation in this dialect and
    /// is treated by the proxy as an immediate no-op success. `Err` is a
    /// translation failure.
    fn translate_command(&self, command: &Command) -> Result<Option<String>>;

    /// Convert reply text from the far end into a result
    fn translate_response(&self, command: &Command, text: &str) -> CommandResult;
}

/// Create the translator for a configured dialect
pub fn create_translator(dialect: &str) -> Result<Arc<dyn CommandTranslator>> {
    match dialect.to_ascii_lowercase().as_str() {
        "tcs" => Ok(Arc::new(TcsTranslator)),
        "simulator" | "sim" => Ok(Arc::new(SimulatorTranslator)),
        _ => Err(Error::UnknownDialect(dialect.to_string())),
    }
}

/// Translate a reply, mapping the far-end timeout marker first
///
/// A reply beginning with [`TIMEOUT_MARKER`] always becomes a failure with
/// [`codes::FAR_END_TIMEOUT`], whatever the dialect or command type.
pub fn translate_reply(
    translator: &dyn CommandTranslator,
    command: &Command,
    text: &str,
) -> CommandResult {
    if text.trim_start().starts_with(TIMEOUT_MARKER) {
        return CommandResult::failed(codes::FAR_END_TIMEOUT, text.trim());
    }
    translator.translate_response(command, text)
}

/// Parse a `<ok-word> values...` / `<fail-word> <code> <message>` reply
///
/// Replies with neither status word are successes carrying every token.
pub(crate) fn parse_status_reply(text: &str, ok_word: &str, fail_words: &[&str]) -> CommandResult {
    let mut tokens = text.split_whitespace();
    let Some(first) = tokens.next() else {
        return CommandResult::ok(Vec::new());
    };

    if first.eq_ignore_ascii_case(ok_word) {
        return CommandResult::ok(tokens.map(str::to_string).collect());
    }

    if fail_words.iter().any(|w| first.eq_ignore_ascii_case(w)) {
        let rest: Vec<&str> = tokens.collect();
        return match rest.first().and_then(|t| t.parse::<i32>().ok()) {
            Some(code) if code != codes::OK => CommandResult::failed(code, rest[1..].join(" ")),
            _ => CommandResult::failed(codes::FAR_END_ERROR, rest.join(" ")),
        };
    }

    CommandResult::ok(text.split_whitespace().map(str::to_string).collect())
}

/// Reject coordinates the far end cannot accept
pub(crate) fn require_finite(what: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::Translation(format!("{} is not finite: {}", what, value)))
    }
}

/// Reject empty identifiers
pub(crate) fn require_word<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() || value.contains(char::is_whitespace) {
        Err(Error::Translation(format!("{} must be a single word: {:?}", what, value)))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_commands() -> Vec<Command> {
        vec![
            Command::Slew {
                ra_deg: 1.0,
                dec_deg: 2.0,
            },
            Command::Offset {
                ra_arcsec: 1.0,
                dec_arcsec: 2.0,
            },
            Command::Focus { position_mm: 0.5 },
            Command::Autoguide { enable: true },
            Command::Rotator { angle_deg: 90.0 },
            Command::Instrument {
                name: "IO:O".into(),
            },
            Command::Show {
                key: "AZIMUTH".into(),
            },
            Command::Stop,
            Command::Raw {
                text: "PING".into(),
            },
        ]
    }

    #[test]
    fn test_create_translator() {
        assert_eq!(create_translator("tcs").unwrap().name(), "tcs");
        assert_eq!(create_translator("TCS").unwrap().name(), "tcs");
        assert_eq!(create_translator("simulator").unwrap().name(), "simulator");
        assert!(matches!(
            create_translator("lx200"),
            Err(Error::UnknownDialect(_))
        ));
    }

    #[test]
    fn test_timeout_marker_for_every_command_and_dialect() {
        for dialect in ["tcs", "simulator"] {
            let translator = create_translator(dialect).unwrap();
            for cmd in all_commands() {
                let result = translate_reply(translator.as_ref(), &cmd, "<<090000>> expired");
                assert!(!result.success, "{} {:?}", dialect, cmd);
                assert_eq!(result.code, codes::FAR_END_TIMEOUT);
            }
        }
    }

    #[test]
    fn test_marker_must_be_prefix() {
        let result = translate_reply(&TcsTranslator, &Command::Stop, "OK <<090");
        assert!(result.success);
    }

    #[test]
    fn test_parse_status_reply() {
        assert_eq!(
            parse_status_reply("OK 1.0 2.0", "OK", &["ERR"]),
            CommandResult::ok(vec!["1.0".into(), "2.0".into()])
        );
        assert_eq!(
            parse_status_reply("ERR 12 axis fault", "OK", &["ERR"]),
            CommandResult::failed(12, "axis fault")
        );
        assert_eq!(
            parse_status_reply("ERR axis fault", "OK", &["ERR"]),
            CommandResult::failed(codes::FAR_END_ERROR, "axis fault")
        );
        assert_eq!(
            parse_status_reply("", "OK", &["ERR"]),
            CommandResult::ok(Vec::new())
        );
        assert_eq!(
            parse_status_reply("TRACKING 3", "OK", &["ERR"]),
            CommandResult::ok(vec!["TRACKING".into(), "3".into()])
        );
    }
}
