//! Options for decoding and anonymization, loadable from JSON

use crate::error::{Result, TwixError};
use bon::Builder;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Index the record stream first, then decode data records on the rayon pool.
    #[builder(default)]
    pub parallel: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DecodeOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct AnonymizeOptions {
    /// Replaces identifying characters.
    #[builder(default = 'x')]
    pub filler: char,
    /// Written in place of the patient birth date.
    #[builder(default = "19700101".to_owned())]
    pub birth_date: String,
    /// Written in place of each patient sex digit.
    #[builder(default = '0')]
    pub sex_value: char,
}

impl Default for AnonymizeOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl AnonymizeOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Replacements must be single-byte and must not touch quoting.
    pub fn validate(&self) -> Result<()> {
        if !self.filler.is_ascii_graphic() || self.filler == '"' {
            return Err(TwixError::format(format!(
                "filler {:?} must be a printable ASCII character other than a quote",
                self.filler
            )));
        }
        if !self.sex_value.is_ascii_digit() {
            return Err(TwixError::format(format!(
                "sex value {:?} must be an ASCII digit",
                self.sex_value
            )));
        }
        if !self.birth_date.chars().all(|c| c.is_ascii_digit()) {
            return Err(TwixError::format(format!(
                "birth date {:?} must be ASCII digits",
                self.birth_date
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert!(!DecodeOptions::default().parallel);
        let options = AnonymizeOptions::default();
        assert_eq!(options.filler, 'x');
        assert_eq!(options.birth_date, "19700101");
        assert_eq!(options.sex_value, '0');
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_from_json_fills_missing_fields() -> Result<()> {
        let decode = DecodeOptions::from_json(r#"{"parallel": true}"#)?;
        assert!(decode.parallel);

        let anonymize = AnonymizeOptions::from_json(r#"{"filler": "*"}"#)?;
        assert_eq!(anonymize.filler, '*');
        assert_eq!(anonymize.birth_date, "19700101");
        Ok(())
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        assert!(AnonymizeOptions::from_json(r#"{"filler": "\""}"#).is_err());
        assert!(AnonymizeOptions::from_json(r#"{"sex_value": "M"}"#).is_err());
        assert!(AnonymizeOptions::from_json(r#"{"birth_date": "1970-01-01"}"#).is_err());
        assert!(DecodeOptions::from_json("not json").is_err());
    }
}
