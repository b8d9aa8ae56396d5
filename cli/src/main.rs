use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use log::{LevelFilter, info};
use x509ck_verify::{Role, VerificationOutcome, Verifier};

mod error;
mod output;
mod status;

use error::{Error, Result};
use output::{OutputFormat, Report};
use status::Status;

#[derive(Parser)]
#[command(name = "x509ck", version)]
#[command(
    about = "Check that a certificate matches an RSA private key and, optionally, a CA",
    long_about = None
)]
struct Cli {
    /// PEM encoded certificate authority that must have signed the certificate
    #[arg(short = 'a', long = "ca", value_name = "CA.pem")]
    ca: Option<PathBuf>,

    /// PEM encoded certificate
    #[arg(short, long, value_name = "CERT.pem")]
    cert: PathBuf,

    /// PEM encoded PKCS#1 RSA private key
    #[arg(short, long, value_name = "KEY.pem")]
    key: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not errors
            return if e.use_stderr() {
                ExitCode::from(Status::Usage.exit_code())
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_logger(cli.verbose);

    let report = match run(&cli) {
        Ok(outcome) => report_outcome(&cli, &outcome),
        Err(e) => Report::from(&e),
    };
    if let Err(e) = report.print(cli.output) {
        eprintln!("{e}");
        return ExitCode::from(Report::from(&e).exit_code());
    }
    ExitCode::from(report.exit_code())
}

fn init_logger(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Info);
        }
        2 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }
    builder.init();
}

// Reads and decodes the inputs in the order CA, certificate, key, stopping at
// the first one that fails.
fn run(cli: &Cli) -> Result<VerificationOutcome> {
    let authority = cli
        .ca
        .as_deref()
        .map(|path| {
            let input = read_input(path, Role::CertificateAuthority)?;
            x509ck_verify::decode_certificate(&input, Role::CertificateAuthority)
                .map_err(|source| decode_error(path, source))
        })
        .transpose()?;

    let input = read_input(&cli.cert, Role::Certificate)?;
    let certificate = x509ck_verify::decode_certificate(&input, Role::Certificate)
        .map_err(|source| decode_error(&cli.cert, source))?;

    let input = read_input(&cli.key, Role::PrivateKey)?;
    let key = x509ck_verify::decode_private_key(&input)
        .map_err(|source| decode_error(&cli.key, source))?;

    let mut verifier = Verifier::new(&certificate, &key);
    if let Some(authority) = &authority {
        verifier = verifier.with_authority(authority);
    }
    let outcome = verifier.run();
    info!("verification finished: {outcome:?}");
    Ok(outcome)
}

fn read_input(path: &Path, role: Role) -> Result<Vec<u8>> {
    info!("reading {role} from '{}'", path.display());
    std::fs::read(path).map_err(|source| Error::Read {
        role,
        path: path.to_path_buf(),
        source,
    })
}

fn decode_error(path: &Path, source: x509ck_verify::Error) -> Error {
    Error::Decode {
        path: path.to_path_buf(),
        source,
    }
}

fn report_outcome(cli: &Cli, outcome: &VerificationOutcome) -> Report {
    let cert = cli.cert.display();
    let key = cli.key.display();
    let message = match outcome {
        VerificationOutcome::Ok => "x509 ok!".to_string(),
        VerificationOutcome::AlgorithmMismatch { .. } => {
            format!("certificate '{cert}': not an RSA-derived certificate")
        }
        VerificationOutcome::ModulusMismatch => {
            format!("certificate '{cert}' modulus doesn't match that of private key {key}")
        }
        VerificationOutcome::ExponentMismatch => {
            format!("certificate '{cert}' exponent doesn't match that of private key {key}")
        }
        VerificationOutcome::SignatureInvalid(e) => {
            let ca = cli
                .ca
                .as_deref()
                .map(|ca| ca.display().to_string())
                .unwrap_or_default();
            format!("certificate '{cert}' isn't signed by certificate authority '{ca}' ({e})")
        }
    };
    Report::new(Status::from(outcome), message)
}
