//! CLI error type and stderr reporting.

use std::io::{self, Write};
use std::time::Duration;

use thiserror::Error;

use crate::lifecycle::MarkerError;
use crate::registrar::RegistrarError;

#[derive(Debug, Error)]
pub enum CliError {
    /// A registrar call failed; `intro` says what we were trying to do.
    #[error("{intro}")]
    Registrar {
        intro: String,
        #[source]
        source: RegistrarError,
    },

    #[error(transparent)]
    Marker(#[from] MarkerError),

    #[error("Timed out after {0:?} waiting for the service to consume the reload marker")]
    ReloadTimeout(Duration),

    #[error("Unable to write output: {0}")]
    Output(#[from] io::Error),
}

impl CliError {
    pub fn registrar(intro: impl Into<String>, source: RegistrarError) -> Self {
        CliError::Registrar {
            intro: intro.into(),
            source,
        }
    }

    /// Error code for the failure, when there is one.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            CliError::Registrar { source, .. } => Some(source.code()),
            _ => None,
        }
    }

    /// Write the error in `[Error] ...` form.
    pub fn report(&self, err: &mut impl Write) -> io::Result<()> {
        writeln!(err, "[Error] {}", self)?;
        if let CliError::Registrar { source, .. } = self {
            writeln!(err, "[Error] {} ({})", source, source.code())?;
            if let Some(info) = source.info() {
                writeln!(err, "{}", info)?;
            }
        }
        Ok(())
    }
}
