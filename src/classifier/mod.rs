//! Maps upstream pipeline error text to an HTML remediation hint.
//!
//! The hint texts are consumed verbatim by downstream mail parsers, so
//! they must not be reworded.

const MISSING_SOURCE_FILE: &str = concat!(
    "<br>Suggested Action: <br>\t\t\t\t 1.Please verify the folder structure of the data source and ensure the structure is correct.",
    "<br>\t\t\t\t 2.Please check whether the file is available at the source path. <br>\t\t\t\t 3.Rerun the pipeline once the file is available.",
);

const SQL_EXCEPTION: &str = concat!(
    "<br>Suggested Action: <br>\t\t\t\t 1.Please verify the sql database is available and the required objects exist.",
    "<br>\t\t\t\t 2.Rerun the pipeline once the required database objects are available.",
);

const KEY_VAULT: &str = concat!(
    "<br>Suggested Action: <br>\t\t\t\t 1.Please verify the specified key vault is available and the required secrets exist.",
    "<br>\t\t\t\t 2.Rerun the pipeline once the key vault and the required secrets are available.",
);

const REST_SOURCE_CALL: &str = concat!(
    "<br>Suggested Action: <br>\t\t\t\t 1.Please verify the data source URL and the credentials are correct.",
    "<br>\t\t\t\t 2.Rerun the pipeline after ensuring the data source URL and the credentials are correct.",
);

const UNRECOGNIZED: &str =
    "<br>Suggested Action: Please contact the technical team to solve the issue.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    MissingSourceFile,
    SqlException,
    KeyVault,
    RestSourceCall,
    Unrecognized,
}

enum Pattern {
    IgnoreCase(&'static str),
    Exact(&'static str),
}

impl Pattern {
    fn is_found_in(&self, text: &str) -> bool {
        match self {
            Self::IgnoreCase(needle) => text.to_lowercase().contains(*needle),
            Self::Exact(needle) => text.contains(*needle),
        }
    }
}

// Evaluated top to bottom, first match wins. Only the first rule ignores
// case; the others must keep matching case-sensitively.
const RULES: [(Pattern, FailureCategory); 4] = [
    (
        Pattern::IgnoreCase("file is not available"),
        FailureCategory::MissingSourceFile,
    ),
    (
        Pattern::Exact("System.Data.SqlClient.SqlException"),
        FailureCategory::SqlException,
    ),
    (Pattern::Exact("vaultBaseUrl"), FailureCategory::KeyVault),
    (
        Pattern::Exact("RestSourceCallFailed"),
        FailureCategory::RestSourceCall,
    ),
];

impl FailureCategory {
    /// Picks the category of the first rule matching `error_text`.
    pub fn detect(error_text: &str) -> Self {
        RULES
            .iter()
            .find(|(pattern, _)| pattern.is_found_in(error_text))
            .map_or(Self::Unrecognized, |(_, category)| *category)
    }

    pub const fn suggestion(self) -> &'static str {
        match self {
            Self::MissingSourceFile => MISSING_SOURCE_FILE,
            Self::SqlException => SQL_EXCEPTION,
            Self::KeyVault => KEY_VAULT,
            Self::RestSourceCall => REST_SOURCE_CALL,
            Self::Unrecognized => UNRECOGNIZED,
        }
    }
}

/// Returns the remediation hint for `error_text`, or an empty string when
/// there is no error text at all.
pub fn classify(error_text: &str) -> String {
    if error_text.is_empty() {
        return String::new();
    }
    FailureCategory::detect(error_text).suggestion().to_owned()
}
