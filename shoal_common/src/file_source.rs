//! The `FileSource` descriptor: a wire-format handle identifying a block of
//! a file an RDD could be sourced from.
//!
//! No transformation in this crate reads from one yet; the wire contract
//! is implemented and round-trip tested as a standalone external interface.

use crate::error::{Result, ShoalError};

const DELIM: char = '\u{1F}'; // FSD: unit separator, kept out of normal text

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileFormat {
    Byte,
    Line,
}

impl FileFormat {
    fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Byte => "byte",
            FileFormat::Line => "line",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        match s {
            "byte" => Ok(FileFormat::Byte),
            "line" => Ok(FileFormat::Line),
            other => Err(ShoalError::ParseError(format!("unknown file format: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    pub source: String,
    pub path: String,
    pub length: u64,
    pub listen_port: u16,
    pub location: String,
    pub format: FileFormat,
}

impl FileSource {
    pub fn serialize(&self) -> String {
        format!(
            "{}{DELIM}{}{DELIM}{}{DELIM}{}{DELIM}{}{DELIM}{}",
            self.source,
            self.path,
            self.length,
            self.listen_port,
            self.location,
            self.format.as_str()
        )
    }

    pub fn deserialize(wire: &str) -> Result<Self> {
        let fields: Vec<&str> = wire.split(DELIM).collect();
        match fields.as_slice() {
            [source, path, length, listen_port, location, format] => Ok(FileSource {
                source: source.to_string(),
                path: path.to_string(),
                length: length
                    .parse()
                    .map_err(|_| ShoalError::ParseError(format!("invalid length: {length}")))?,
                listen_port: listen_port.parse().map_err(|_| {
                    ShoalError::ParseError(format!("invalid listen port: {listen_port}"))
                })?,
                location: location.to_string(),
                format: FileFormat::parse(format)?,
            }),
            _ => Err(ShoalError::ParseError(format!(
                "expected 6 FSD-delimited fields, got: {wire}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let fs = FileSource {
            source: "s3".into(),
            path: "/data/part-0".into(),
            length: 4096,
            listen_port: 9000,
            location: "host-a".into(),
            format: FileFormat::Line,
        };
        let wire = fs.serialize();
        assert_eq!(FileSource::deserialize(&wire).unwrap(), fs);
    }
}
