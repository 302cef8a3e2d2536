pub type Result<T> = std::result::Result<T, ShoalError>;

#[derive(Debug, PartialEq)]
pub enum ShoalError {
    IoError(String),
    SerializationError(String),
    ParseError(String),
    PortInUse(u16),
    IllegalArgument(String),
    Other(String),
}

impl std::fmt::Display for ShoalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShoalError::IoError(s) => write!(f, "io error: {s}"),
            ShoalError::SerializationError(s) => write!(f, "serialization error: {s}"),
            ShoalError::ParseError(s) => write!(f, "parse error: {s}"),
            ShoalError::PortInUse(port) => write!(f, "port {port} already in use"),
            ShoalError::IllegalArgument(s) => write!(f, "illegal argument: {s}"),
            ShoalError::Other(s) => write!(f, "{s}"),
        }
    }
}

impl std::error::Error for ShoalError {}

impl<T> From<ShoalError> for Result<T> {
    fn from(val: ShoalError) -> Self {
        Result::Err(val)
    }
}

macro_rules! convert_to_shoal_error {
    ($err_ty: ty, $constructor: expr) => {
        impl From<$err_ty> for ShoalError {
            fn from(value: $err_ty) -> Self {
                $constructor(value.to_string())
            }
        }
    };
}

convert_to_shoal_error!(std::io::Error, ShoalError::IoError);
convert_to_shoal_error!(serde_json::Error, ShoalError::SerializationError);
convert_to_shoal_error!(std::num::ParseIntError, ShoalError::ParseError);
convert_to_shoal_error!(String, ShoalError::Other);
