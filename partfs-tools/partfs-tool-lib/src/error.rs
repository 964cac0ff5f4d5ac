use partfs::{ErrorKind, PartFsError, PartFsErrorConvertible};
use std::fmt::Formatter;

/// Failure of the file-backed disk handler.
#[derive(Debug, PartialEq, Clone)]
pub struct ImageError {
    message: String,
}

impl ImageError {
    pub fn new(message: &str) -> Self {
        return ImageError {
            message: String::from(message),
        };
    }
}

impl PartFsErrorConvertible for ImageError {}

impl std::fmt::Display for ImageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}", self.message);
    }
}

/// Anything a command can fail with.
#[derive(Debug, PartialEq, Clone)]
pub enum CommandError {
    /// Malformed line, unknown command or flag, missing or invalid flag value.
    Parse(String),
    Fs(PartFsError<ImageError>),
    Io(ImageError),
}

impl CommandError {
    pub fn parse(message: &str) -> Self {
        return CommandError::Parse(String::from(message));
    }

    /// The filesystem classification, if the failure came from below the parser.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            CommandError::Parse(_) => None,
            CommandError::Fs(e) => Some(e.kind()),
            CommandError::Io(_) => Some(ErrorKind::Io),
        }
    }
}

impl From<PartFsError<ImageError>> for CommandError {
    fn from(e: PartFsError<ImageError>) -> Self {
        return CommandError::Fs(e);
    }
}

impl From<ImageError> for CommandError {
    fn from(e: ImageError) -> Self {
        return CommandError::Io(e);
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Parse(message) => write!(f, "{}", message),
            CommandError::Fs(e) => write!(f, "{}", e),
            CommandError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CommandError {}
