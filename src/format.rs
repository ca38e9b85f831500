use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Response formats a row query can ask for through its `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Csv,
    Json,
    RdfXml,
    Xml,
}

impl Format {
    pub const ALL: [Format; 4] = [Format::Csv, Format::Json, Format::RdfXml, Format::Xml];

    /// Token accepted by [`Format::from_str`], e.g. `rdfxml`.
    pub fn token(self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Json => "json",
            Format::RdfXml => "rdfxml",
            Format::Xml => "xml",
        }
    }

    pub fn mimetype(self) -> &'static str {
        match self {
            Format::Csv => "text/csv; charset=utf-8",
            Format::Json => "application/json; charset=utf-8",
            Format::RdfXml => "application/rdf+xml; charset=utf-8",
            Format::Xml => "text/xml; charset=utf-8",
        }
    }

    /// File extension used by the export endpoints.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Json => "json",
            Format::RdfXml => "rdf",
            Format::Xml => "xml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Format::ALL
            .into_iter()
            .find(|f| f.token() == s)
            .ok_or_else(|| {
                let tokens: Vec<&str> = Format::ALL.iter().map(|f| f.token()).collect();
                Error::InvalidArgument(format!(
                    "content_type must be one of: {}",
                    tokens.join(", ")
                ))
            })
    }
}

/// Resource paths served by a SODA host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Discovery,
    Dataset,
    Metadata,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Discovery => "/api/catalog/v1",
            Endpoint::Dataset => "/resource",
            Endpoint::Metadata => "/api/views/metadata/v1",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_token() {
        for f in Format::ALL {
            assert_eq!(f.token().parse::<Format>().unwrap(), f);
        }
    }

    #[test]
    fn rejects_unknown_token() {
        let err = "error".parse::<Format>().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(
            err.to_string(),
            "invalid argument: content_type must be one of: csv, json, rdfxml, xml"
        );
    }

    #[test]
    fn tokens_are_case_sensitive() {
        assert!("JSON".parse::<Format>().is_err());
    }

    #[test]
    fn mimetypes_and_extensions() {
        assert_eq!(Format::Csv.mimetype(), "text/csv; charset=utf-8");
        assert_eq!(Format::Json.mimetype(), "application/json; charset=utf-8");
        assert_eq!(Format::RdfXml.mimetype(), "application/rdf+xml; charset=utf-8");
        assert_eq!(Format::Xml.mimetype(), "text/xml; charset=utf-8");
        assert_eq!(Format::RdfXml.extension(), "rdf");
        assert_eq!(Format::Json.extension(), "json");
    }

    #[test]
    fn endpoint_paths() {
        assert_eq!(Endpoint::Discovery.path(), "/api/catalog/v1");
        assert_eq!(Endpoint::Dataset.path(), "/resource");
        assert_eq!(Endpoint::Metadata.path(), "/api/views/metadata/v1");
    }
}
