use std::error::Error as _;
use thiserror::Error;
use tracing::error;
use validify::ValidationErrors;

#[derive(Debug, Error)]
pub enum DocpathErr {
    #[error("Does not exist; {0}")]
    DoesNotExist(String),

    #[error("Invalid owner; {0}")]
    InvalidOwner(String),

    #[error("Invalid path; {0}")]
    InvalidPath(String),

    #[error("Node conflict; {0}")]
    NodeConflict(String),

    #[error("Invalid custom field value; {0}")]
    InvalidCustomFieldValue(String),

    #[error("Template syntax; {0}")]
    TemplateSyntax(String),

    #[error("Template type; {0}")]
    TemplateType(String),

    #[error("Template security; {0}")]
    TemplateSecurity(String),

    #[error("Bulk move aborted after {moved} documents; {cause}")]
    BulkAborted {
        moved: usize,
        #[source]
        cause: Box<DocpathError>,
    },

    #[error("SQL; {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("JSON error; {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Validation; {0}")]
    Validation(#[from] ValidationErrors),
}

#[derive(Debug, Error)]
#[error("{error}")]
pub struct DocpathError {
    file: &'static str,
    line: u32,
    column: u32,
    pub error: DocpathErr,
}

impl DocpathError {
    pub fn new(file: &'static str, line: u32, column: u32, error: DocpathErr) -> DocpathError {
        DocpathError {
            file,
            line,
            column,
            error,
        }
    }

    pub fn location(&self) -> String {
        format!("{}:{}:{}", self.file, self.line, self.column)
    }

    /// Returns the innermost error, unwrapping any [DocpathErr::BulkAborted] layers.
    pub fn root(&self) -> &DocpathErr {
        match &self.error {
            DocpathErr::BulkAborted { cause, .. } => cause.root(),
            error => error,
        }
    }

    pub fn print(&self) {
        let location = self.location();

        error!("{location} | {self}");

        if self.error.source().is_some() {
            error!("Causes:");
        }

        let mut src = self.error.source();
        while let Some(source) = src {
            error!(" - {source}");
            src = source.source();
        }
    }
}

#[macro_export]
macro_rules! err {
    ($ty:ident $(, $l:literal $(,)? $($args:expr),* )?) => {
        Err($crate::error::DocpathError::new(
            file!(),
            line!(),
            column!(),
            $crate::error::DocpathErr::$ty $( (format!($l, $( $args, )*)) )?,
        ))
    };
}

#[macro_export]
macro_rules! map_err {
    ($ex:expr) => {
        $ex.map_err(|e| $crate::error::DocpathError::new(file!(), line!(), column!(), e.into()))?
    };
}
