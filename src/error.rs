use std::io;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    StringError(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serde JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

// Helper to convert from String to Error
impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::StringError(s)
    }
}

// Helper to convert from &str to Error
impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::StringError(s.to_string())
    }
}

#[macro_export]
macro_rules! string_error {
    ($($arg:tt)*) => {
        $crate::error::Error::StringError(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::string_error!($($arg)*))
    };
}
