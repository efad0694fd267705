//! Typed access to MPD attribute maps.
//!
//! MPD answers every query with `key: value` lines. [`AttrParser`] reads
//! fields out of such a map one at a time, each under a [`Requirement`]:
//! a required field that is missing or malformed aborts the record, an
//! optional one silently falls back to its zero value.

use std::time::Duration;

use super::Attrs;

/// Whether a field must be present and well formed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Failure aborts the whole record
    Required,
    /// Failure yields the zero value
    Optional,
}

/// A field could not be read from an attribute map
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The field is absent
    #[error("Field `{field}` is missing")]
    Missing {
        /// Name of the missing field
        field: String,
    },

    /// The field is present but holds an unexpected value
    #[error("Field `{field}` = `{value}` parsing failed: {reason}")]
    Invalid {
        /// Name of the field
        field: String,
        /// Raw value received from MPD
        value: String,
        /// Why the value was rejected
        reason: String,
    },
}

/// Reads typed fields from an attribute map, remembering the first required failure.
///
/// Once a required field has failed, every later read returns the zero value
/// without looking at the map, so the finished record is all zeroes past that
/// point and [`AttrParser::finish`] reports the original failure.
#[derive(Debug)]
pub struct AttrParser<'a> {
    attrs: &'a Attrs,
    error: Option<ParseError>,
}

impl<'a> AttrParser<'a> {
    /// Start parsing the given map
    pub fn new(attrs: &'a Attrs) -> Self {
        Self { attrs, error: None }
    }

    /// Whether the map carries the field at all
    pub fn has(&self, field: &str) -> bool {
        self.attrs.contains_key(field)
    }

    /// Read a string field
    pub fn string(&mut self, field: &str, requirement: Requirement) -> String {
        self.read(field, requirement, |raw| Ok(raw.to_string()))
    }

    /// Read a signed integer field
    pub fn int(&mut self, field: &str, requirement: Requirement) -> i64 {
        self.read(field, requirement, |raw| {
            raw.trim().parse::<i64>().map_err(|e| e.to_string())
        })
    }

    /// Read an unsigned integer field
    pub fn uint(&mut self, field: &str, requirement: Requirement) -> u64 {
        self.read(field, requirement, |raw| {
            raw.trim().parse::<u64>().map_err(|e| e.to_string())
        })
    }

    /// Read a floating point field
    pub fn float(&mut self, field: &str, requirement: Requirement) -> f64 {
        self.read(field, requirement, |raw| {
            raw.trim().parse::<f64>().map_err(|e| e.to_string())
        })
    }

    /// Read a boolean field encoded as `0` or `1`
    pub fn bool(&mut self, field: &str, requirement: Requirement) -> bool {
        self.read(field, requirement, |raw| match raw {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err("expected 0 or 1".to_string()),
        })
    }

    /// Read a duration given in fractional seconds
    pub fn duration(&mut self, field: &str, requirement: Requirement) -> Duration {
        self.read(field, requirement, |raw| {
            let secs = raw.trim().parse::<f64>().map_err(|e| e.to_string())?;
            Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
        })
    }

    /// Finish the record, returning the first required-field failure if any
    ///
    /// # Errors
    /// Returns the first [`ParseError`] raised by a required field.
    pub fn finish(self) -> Result<(), ParseError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn read<T, F>(&mut self, field: &str, requirement: Requirement, convert: F) -> T
    where
        T: Default,
        F: FnOnce(&str) -> Result<T, String>,
    {
        if self.error.is_some() {
            return T::default();
        }

        let result = match self.attrs.get(field) {
            Some(raw) => convert(raw).map_err(|reason| ParseError::Invalid {
                field: field.to_string(),
                value: raw.clone(),
                reason,
            }),
            None => Err(ParseError::Missing {
                field: field.to_string(),
            }),
        };

        match result {
            Ok(value) => value,
            Err(err) => {
                if requirement == Requirement::Required {
                    self.error = Some(err);
                }
                T::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attrs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn bool_accepts_only_zero_and_one() {
        let map = attrs(&[("a", "1"), ("b", "0"), ("c", "true")]);
        let mut parser = AttrParser::new(&map);

        assert!(parser.bool("a", Requirement::Required));
        assert!(!parser.bool("b", Requirement::Required));
        assert!(!parser.bool("c", Requirement::Optional));
        assert!(parser.finish().is_ok());

        let mut parser = AttrParser::new(&map);
        parser.bool("c", Requirement::Required);
        assert!(matches!(
            parser.finish(),
            Err(ParseError::Invalid { field, .. }) if field == "c"
        ));
    }

    #[test]
    fn optional_failure_yields_zero_without_aborting() {
        let map = attrs(&[("volume", "loud"), ("state", "play")]);
        let mut parser = AttrParser::new(&map);

        assert_eq!(parser.int("volume", Requirement::Optional), 0);
        assert_eq!(parser.string("state", Requirement::Required), "play");
        assert_eq!(parser.float("missing", Requirement::Optional), 0.0);
        assert!(parser.finish().is_ok());
    }

    #[test]
    fn first_required_failure_wins_and_zeroes_the_rest() {
        let map = attrs(&[("repeat", "x"), ("single", "1"), ("state", "play")]);
        let mut parser = AttrParser::new(&map);

        assert!(!parser.bool("repeat", Requirement::Required));
        assert!(!parser.bool("single", Requirement::Required));
        assert_eq!(parser.string("state", Requirement::Required), "");
        parser.int("nope", Requirement::Required);

        assert!(matches!(
            parser.finish(),
            Err(ParseError::Invalid { field, .. }) if field == "repeat"
        ));
    }

    #[test]
    fn missing_required_field_is_reported() {
        let map = attrs(&[]);
        let mut parser = AttrParser::new(&map);
        parser.string("state", Requirement::Required);

        assert_eq!(
            parser.finish(),
            Err(ParseError::Missing {
                field: "state".to_string()
            })
        );
    }

    #[test]
    fn fractional_seconds_become_durations() {
        let map = attrs(&[("elapsed", "12.345"), ("bad", "-1")]);
        let mut parser = AttrParser::new(&map);

        assert_eq!(
            parser.duration("elapsed", Requirement::Required),
            Duration::from_secs_f64(12.345)
        );
        assert_eq!(parser.duration("bad", Requirement::Optional), Duration::ZERO);
        assert!(parser.finish().is_ok());
    }
}
