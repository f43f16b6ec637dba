use clap::{Parser, Subcommand};

/// Upper bound for the number of documents fetched and updated per page during a bulk move.
pub const PAGE_SIZE: usize = 1000;
/// Title of the owner's root folder.
pub const HOME_TITLE: &str = ".home";
/// Title of the owner's landing folder.
pub const INBOX_TITLE: &str = ".inbox";
/// Format of dates coming from users and stored custom field values.
pub const INCOMING_DATE_FORMAT: &str = "%Y-%m-%d";
/// Notification emitted after a single document was moved.
pub const NOTIF_DOCUMENT_MOVED: &str = "document_moved";
/// Notification emitted after documents of a type were moved in bulk.
pub const NOTIF_DOCUMENTS_MOVED: &str = "documents_moved";

#[derive(Debug, Parser)]
#[command(name = "docpath", version = "0.1", about = "Move documents according to their path templates", long_about = None)]
pub struct StartArgs {
    /// Database URL.
    #[arg(short, long)]
    db_url: Option<String>,

    /// RUST_LOG string to use as the env filter.
    #[arg(short, long)]
    log: Option<String>,

    /// Maximum amount of documents processed per page in bulk moves.
    #[arg(short, long)]
    page_size: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate the path template of a single document and move it.
    MoveDocument {
        /// Document ID.
        #[arg(long)]
        id: uuid::Uuid,
    },

    /// Evaluate the path template for every document of a type and move them.
    MoveDocuments {
        /// Document type ID.
        #[arg(long)]
        type_id: uuid::Uuid,
    },
}

/// Implement a getter method on [StartArgs], using the `$var` environment variable as a fallback
/// and either panic or default if neither the argument nor the environment variable is set.
macro_rules! arg {
    ($id:ident, $var:literal, panic $msg:literal) => {
        impl StartArgs {
            pub fn $id(&self) -> String {
                match &self.$id {
                    Some(val) => val.to_string(),
                    None => match std::env::var($var) {
                        Ok(val) => val,
                        Err(_) => panic!($msg),
                    },
                }
            }
        }
    };
    ($id:ident, $var:literal, default $value:expr) => {
        impl StartArgs {
            pub fn $id(&self) -> String {
                match &self.$id {
                    Some(val) => val.to_string(),
                    None => match std::env::var($var) {
                        Ok(val) => val,
                        Err(_) => $value,
                    },
                }
            }
        }
    };
}

arg!(db_url,     "DATABASE_URL", panic   "Database url not found; Pass --db-url or set DATABASE_URL");
arg!(log,        "RUST_LOG",     default "info".to_string());
arg!(page_size,  "PAGE_SIZE",    default PAGE_SIZE.to_string());

impl StartArgs {
    /// The configured page size, clamped to `1..=PAGE_SIZE`.
    pub fn max_page_size(&self) -> usize {
        self.page_size()
            .parse::<usize>()
            .unwrap_or(PAGE_SIZE)
            .clamp(1, PAGE_SIZE)
    }
}
