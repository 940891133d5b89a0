use crate::crypto::Pkcs12Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while canonicalizing or signing a document.
///
/// Every variant terminates the call; nothing is retried internally.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("There's a format error in your XML: {0}")]
    XmlFormat(String),

    #[error("Unsupported XML feature: {feature}. {description}")]
    UnsupportedXmlFeature {
        feature: &'static str,
        description: String,
    },

    #[error(
        "Unsupported document type: {0}. Supported types are: factura, liquidacionCompra, notaDebito, notaCredito, comprobanteRetencion, guiaRemision"
    )]
    UnsupportedDocumentType(String),

    #[error("Unexpected document root: expected <{expected}>, but found <{found}>")]
    UnexpectedDocumentRoot { expected: String, found: String },

    #[error("The PKCS#12 archive is not supported: {0}")]
    Pkcs12(#[from] Pkcs12Error),

    #[error("Crypto error: {0}")]
    Crypto(#[from] crate::crypto::Error),
}

impl Error {
    pub(crate) fn unsupported(feature: &'static str, description: impl Into<String>) -> Self {
        Error::UnsupportedXmlFeature {
            feature,
            description: description.into(),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlFormat(err.to_string())
    }
}

impl From<quick_xml::SeError> for Error {
    fn from(err: quick_xml::SeError) -> Self {
        Error::XmlFormat(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlFormat(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::XmlFormat(err.to_string())
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Error::XmlFormat(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Error::XmlFormat(err.utf8_error().to_string())
    }
}
