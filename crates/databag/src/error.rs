use thiserror::Error;

#[derive(Error, Debug)]
pub enum BagError {
    /// A write targeted a key outside the allow-list, or used magic
    /// assignment on a bag type that disables it.
    #[error("{0}")]
    UnassignableAttribute(String),

    /// A nested-bag cast was given a value that cannot be reduced to a mapping.
    #[error(
        "Cannot instantiate data object '{bag_type}' with non-array data for key '{key}'{}",
        data_suffix(.data)
    )]
    InvalidCast {
        bag_type: String,
        key: String,
        data: Option<String>,
    },

    /// A rule or bag type was declared wrongly. This is a programming error,
    /// never a validation outcome.
    #[error("{message}")]
    InvalidArgument {
        message: String,
        #[source]
        source: Option<Box<BagError>>,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] confique::Error),
}

fn data_suffix(data: &Option<String>) -> String {
    match data {
        Some(text) => format!(" (data: {})", text),
        None => String::new(),
    }
}

impl BagError {
    pub fn unassignable(message: impl Into<String>) -> Self {
        BagError::UnassignableAttribute(message.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        BagError::InvalidArgument {
            message: message.into(),
            source: None,
        }
    }

    pub fn invalid_argument_from(message: impl Into<String>, source: BagError) -> Self {
        BagError::InvalidArgument {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

pub type Result<T> = std::result::Result<T, BagError>;
