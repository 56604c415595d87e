use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error on {}: {source}", .path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown institution: {0}")]
    UnknownInstitution(String),

    #[error("unknown collection run: {0}")]
    UnknownRun(u64),

    #[error("collection run {0} is already committed")]
    RunCommitted(u64),

    #[error("unknown legislator: {0}")]
    UnknownLegislator(u64),

    #[error("store lock poisoned")]
    Poisoned,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("feed {feed} of {institution} is not a json array")]
    NotAnArray { institution: String, feed: String },

    #[error("no feed {feed} for {institution}")]
    Missing { institution: String, feed: String },
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid {feed} record: {source}")]
    Decode {
        feed: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by named commands.
///
/// `Usage` and `UnknownInstitution` are argument errors; the binary maps
/// them to exit code 2.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("usage: {0}")]
    Usage(String),

    #[error("unknown institution code: {0}")]
    UnknownInstitution(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("collection for {institution} failed: {source}")]
    Collect {
        institution: String,
        #[source]
        source: CollectError,
    },

    #[error("nothing to consolidate for {0}: no committed collection run")]
    NothingToConsolidate(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CommandError {
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            CommandError::Usage(_) | CommandError::UnknownInstitution(_)
        )
    }
}

/// Process exit status for a failed run: 2 for argument errors, 1 otherwise.
pub fn exit_status(err: &anyhow::Error) -> u8 {
    let usage = err
        .downcast_ref::<CommandError>()
        .is_some_and(CommandError::is_usage);
    if usage { 2 } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_errors_exit_with_two() {
        let usage = anyhow::Error::from(CommandError::Usage("collect <institution>...".into()));
        let unknown = anyhow::Error::from(CommandError::UnknownInstitution("alerj".into()));
        assert_eq!(exit_status(&usage), 2);
        assert_eq!(exit_status(&unknown), 2);
    }

    #[test]
    fn other_errors_exit_with_one() {
        let nothing = anyhow::Error::from(CommandError::NothingToConsolidate("CMSP".into()));
        let store = anyhow::Error::from(CommandError::Store(StoreError::Poisoned));
        let config = anyhow::anyhow!("reading config config.json");
        assert_eq!(exit_status(&nothing), 1);
        assert_eq!(exit_status(&store), 1);
        assert_eq!(exit_status(&config), 1);
    }

    #[test]
    fn context_does_not_hide_argument_errors() {
        let err = anyhow::Error::from(CommandError::Usage("consolidate <institution>".into()))
            .context("running consolidate");
        assert_eq!(exit_status(&err), 2);
    }
}
