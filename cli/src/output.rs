use std::io::Write;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::status::Status;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// One line of text; failures to decode go to stderr
    Text,
    /// A JSON object on stdout for every outcome
    Json,
}

/// What a run prints before exiting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Report {
    status: Status,
    exit_code: u8,
    message: String,
}

impl Report {
    pub(crate) fn new(status: Status, message: impl Into<String>) -> Self {
        Report {
            status,
            exit_code: status.exit_code(),
            message: message.into(),
        }
    }

    pub(crate) fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub(crate) fn print(&self, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Text if self.status == Status::Decode => {
                let mut stderr = std::io::stderr().lock();
                writeln!(stderr, "{}", self.message).map_err(Error::Write)
            }
            OutputFormat::Text => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", self.message).map_err(Error::Write)
            }
            OutputFormat::Json => {
                let json = serde_json::to_string(self)?;
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{json}").map_err(Error::Write)
            }
        }
    }
}

impl From<&Error> for Report {
    fn from(error: &Error) -> Self {
        let status = match error {
            Error::Read { .. } | Error::Decode { .. } => Status::Decode,
            Error::Json(_) | Error::Write(_) => Status::Usage,
        };
        Report::new(status, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rstest::rstest;
    use x509ck_verify::Role;

    use super::Report;
    use crate::error::Error;
    use crate::status::Status;

    #[test]
    fn test_report_json_fields() {
        let report = Report::new(Status::ModulusMismatch, "mismatch");
        assert_eq!(
            r#"{"status":"modulus_mismatch","exit_code":4,"message":"mismatch"}"#,
            serde_json::to_string(&report).unwrap()
        );
    }

    #[rstest(
        role,
        path,
        expected,
        case(Role::Certificate, "missing.pem", "certificate 'missing.pem': "),
        case(
            Role::CertificateAuthority,
            "ca/missing.pem",
            "certificate authority 'ca/missing.pem': "
        ),
        case(Role::PrivateKey, "missing.key", "private key 'missing.key': "),
    )]
    fn test_report_for_read_error(role: Role, path: &str, expected: &str) {
        let error = Error::Read {
            role,
            path: PathBuf::from(path),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        let report = Report::from(&error);
        assert_eq!(Status::Decode, report.status);
        assert_eq!(2, report.exit_code());
        assert!(report.message.starts_with(expected));
    }
}
