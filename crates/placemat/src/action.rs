//! Action-script grammar.
//!
//! Each non-blank line of a script is one action:
//!
//! ```text
//! power_on:   rands_num=100000, mg_num=4, pe_num=20, pe_weight=4
//! scale_out:  mg_id=5, pe_num=20, pe_weight=4
//! scale_in:   mg_id=2
//! scale_up:   mg_id=3, pe_id=21, pe_weight=4
//! scale_down: mg_id=3, pe_id=7
//! ```
//!
//! Names are case-insensitive, values are decimal u32, whitespace around
//! tokens is tolerated. Any malformed line aborts the run before a single
//! action executes.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// One scripted topology action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Build a fresh device and place `rands_num` distinct random keys.
    PowerOn {
        /// Number of distinct random keys to generate and place.
        rands_num: u32,
        /// Number of migration groups.
        mg_num: u32,
        /// Placement elements per group.
        pe_num: u32,
        /// Weight of every element.
        pe_weight: u32,
    },
    /// Add a migration group.
    ScaleOut {
        /// Id of the new group.
        mg_id: u32,
        /// Placement elements in the new group.
        pe_num: u32,
        /// Weight of every new element.
        pe_weight: u32,
    },
    /// Remove a migration group.
    ScaleIn {
        /// Id of the group to remove.
        mg_id: u32,
    },
    /// Add a placement element to a group.
    ScaleUp {
        /// Id of the target group.
        mg_id: u32,
        /// Id of the new element.
        pe_id: u32,
        /// Weight of the new element.
        pe_weight: u32,
    },
    /// Remove a placement element from a group.
    ScaleDown {
        /// Id of the target group.
        mg_id: u32,
        /// Id of the element to remove.
        pe_id: u32,
    },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::PowerOn { rands_num, mg_num, pe_num, pe_weight } => write!(
                f,
                "Power on: rands_num = {rands_num}, mg_num = {mg_num}, \
                 pe_num = {pe_num}, pe_weight = {pe_weight}"
            ),
            Self::ScaleOut { mg_id, pe_num, pe_weight } => write!(
                f,
                "Scale out: add MG[{mg_id}], pe_num = {pe_num}, pe_weight = {pe_weight}"
            ),
            Self::ScaleIn { mg_id } => write!(f, "Scale in: del MG[{mg_id}]"),
            Self::ScaleUp { mg_id, pe_id, pe_weight } => {
                write!(f, "Scale up: MG[{mg_id}] add PE[{pe_id}], pe_weight = {pe_weight}")
            }
            Self::ScaleDown { mg_id, pe_id } => {
                write!(f, "Scale down: MG[{mg_id}] del PE[{pe_id}]")
            }
        }
    }
}

/// Script parse failures. Any of these aborts the run before execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A line had no `name:` prefix.
    #[error("line {line}: missing ':' after the action name")]
    MissingColon {
        /// 1-based line number.
        line: usize,
    },

    /// The action name is not one of the five known actions.
    #[error("line {line}: unknown action '{name}'")]
    UnknownAction {
        /// 1-based line number.
        line: usize,
        /// The offending name.
        name: String,
    },

    /// A required `key=value` parameter was absent.
    #[error("line {line}: missing parameter '{key}'")]
    MissingKey {
        /// 1-based line number.
        line: usize,
        /// The missing parameter name.
        key: &'static str,
    },

    /// A parameter was not of the form `key=value`.
    #[error("line {line}: malformed parameter '{param}'")]
    MalformedParam {
        /// 1-based line number.
        line: usize,
        /// The offending fragment.
        param: String,
    },

    /// A parameter value was not a decimal u32.
    #[error("line {line}: invalid value for '{key}': '{value}'")]
    InvalidValue {
        /// 1-based line number.
        line: usize,
        /// The parameter name.
        key: String,
        /// The offending value.
        value: String,
    },
}

/// Parse a whole script. Blank lines are skipped; everything else must be
/// a well-formed action.
pub fn parse_script(script: &str) -> Result<Vec<Action>, ParseError> {
    let mut actions = Vec::new();
    for (index, raw) in script.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        actions.push(parse_line(line, index + 1)?);
    }
    Ok(actions)
}

fn parse_line(line: &str, lineno: usize) -> Result<Action, ParseError> {
    let line = line.to_ascii_lowercase();
    let (name, rest) =
        line.split_once(':').ok_or(ParseError::MissingColon { line: lineno })?;
    let params = parse_params(rest, lineno)?;

    let get = |key: &'static str| -> Result<u32, ParseError> {
        params.get(key).copied().ok_or(ParseError::MissingKey { line: lineno, key })
    };

    match name.trim() {
        "power_on" => Ok(Action::PowerOn {
            rands_num: get("rands_num")?,
            mg_num: get("mg_num")?,
            pe_num: get("pe_num")?,
            pe_weight: get("pe_weight")?,
        }),
        "scale_out" => Ok(Action::ScaleOut {
            mg_id: get("mg_id")?,
            pe_num: get("pe_num")?,
            pe_weight: get("pe_weight")?,
        }),
        "scale_in" => Ok(Action::ScaleIn { mg_id: get("mg_id")? }),
        "scale_up" => Ok(Action::ScaleUp {
            mg_id: get("mg_id")?,
            pe_id: get("pe_id")?,
            pe_weight: get("pe_weight")?,
        }),
        "scale_down" => Ok(Action::ScaleDown { mg_id: get("mg_id")?, pe_id: get("pe_id")? }),
        other => Err(ParseError::UnknownAction { line: lineno, name: other.to_string() }),
    }
}

fn parse_params(rest: &str, lineno: usize) -> Result<HashMap<String, u32>, ParseError> {
    let mut params = HashMap::new();
    for part in rest.split(',') {
        let part = part.trim();
        if part.is_empty() {
            // Tolerate a trailing comma.
            continue;
        }
        let (key, value) = part
            .split_once('=')
            .ok_or_else(|| ParseError::MalformedParam { line: lineno, param: part.to_string() })?;
        let key = key.trim();
        let value = value.trim();
        let parsed = value.parse::<u32>().map_err(|_| ParseError::InvalidValue {
            line: lineno,
            key: key.to_string(),
            value: value.to_string(),
        })?;
        params.insert(key.to_string(), parsed);
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scale_up_round_trip() {
        let actions = parse_script("scale_up: mg_id=3, pe_id=5, pe_weight=7").unwrap();
        assert_eq!(actions, vec![Action::ScaleUp { mg_id: 3, pe_id: 5, pe_weight: 7 }]);
    }

    #[test]
    fn test_parse_tolerates_case_and_whitespace() {
        let actions =
            parse_script("  SCALE_UP:  MG_ID = 3 ,  PE_ID=5,  PE_WEIGHT=7 ,  \t").unwrap();
        assert_eq!(actions, vec![Action::ScaleUp { mg_id: 3, pe_id: 5, pe_weight: 7 }]);
    }

    #[test]
    fn test_parse_full_script() {
        let script = "\
power_on: rands_num=1000, mg_num=2, pe_num=4, pe_weight=4

scale_out: mg_id=3, pe_num=4, pe_weight=4
scale_in: mg_id=1
scale_up: mg_id=2, pe_id=5, pe_weight=4
scale_down: mg_id=2, pe_id=1
";
        let actions = parse_script(script).unwrap();
        assert_eq!(actions.len(), 5);
        assert_eq!(
            actions[0],
            Action::PowerOn { rands_num: 1000, mg_num: 2, pe_num: 4, pe_weight: 4 }
        );
        assert_eq!(actions[2], Action::ScaleIn { mg_id: 1 });
    }

    #[test]
    fn test_parse_unknown_action() {
        let err = parse_script("scale_sideways: mg_id=1").unwrap_err();
        assert_eq!(err, ParseError::UnknownAction { line: 1, name: "scale_sideways".into() });
    }

    #[test]
    fn test_parse_missing_colon() {
        let err = parse_script("power_on rands_num=5").unwrap_err();
        assert_eq!(err, ParseError::MissingColon { line: 1 });
    }

    #[test]
    fn test_parse_missing_key() {
        let err = parse_script("scale_in: pe_id=1").unwrap_err();
        assert_eq!(err, ParseError::MissingKey { line: 1, key: "mg_id" });
    }

    #[test]
    fn test_parse_invalid_value() {
        let err = parse_script("scale_in: mg_id=banana").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidValue { line: 1, key: "mg_id".into(), value: "banana".into() }
        );
    }

    #[test]
    fn test_parse_reports_the_failing_line() {
        let script = "scale_in: mg_id=1\nscale_in: mg_id=\n";
        let err = parse_script(script).unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidValue { line: 2, key: "mg_id".into(), value: String::new() }
        );
    }

    #[test]
    fn test_display_formats_header_text() {
        let action = Action::ScaleOut { mg_id: 9, pe_num: 8, pe_weight: 2 };
        assert_eq!(action.to_string(), "Scale out: add MG[9], pe_num = 8, pe_weight = 2");
    }
}
