#![forbid(unsafe_code)]

//! Firma CLI — sign UBL invoices with an enveloped XML-DSig signature.

use clap::{Parser, Subcommand};
use firma_core::Error;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(
    name = "firma",
    about = "Firma — enveloped XML-DSig signing for UBL electronic invoices",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign an invoice document
    Sign {
        /// Input invoice XML file
        invoice: PathBuf,

        /// PKCS#12 keystore (.pfx/.p12)
        #[arg(short, long)]
        keystore: PathBuf,

        /// Keystore password
        #[arg(short, long)]
        password: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sign {
            invoice,
            keystore,
            password,
            output,
            verbose,
        } => cmd_sign(invoice, keystore, password, output, verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn cmd_sign(
    invoice: PathBuf,
    keystore: PathBuf,
    password: String,
    output: Option<PathBuf>,
    verbose: bool,
) -> Result<(), Error> {
    let xml = std::fs::read_to_string(&invoice)?;

    // Structure must be rejected before any keystore I/O.
    firma_dsig::validate::validate_document(&xml)?;

    let keystore_bytes = read_keystore(&keystore)?;

    if verbose {
        eprintln!("Signing: {}", invoice.display());
    }

    let signed = firma_dsig::sign_invoice(&xml, &keystore_bytes, &password)?;
    write_output(output, signed.as_bytes())
}

/// Read a PKCS#12 keystore, checking path and extension first.
fn read_keystore(path: &Path) -> Result<Vec<u8>, Error> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pfx") | Some("p12") => {}
        _ => {
            return Err(Error::Input(format!(
                "keystore must be a .pfx or .p12 file: {}",
                path.display()
            )))
        }
    }
    if !path.exists() {
        return Err(Error::Input(format!(
            "keystore file not found: {}",
            path.display()
        )));
    }
    Ok(std::fs::read(path)?)
}

fn write_output(path: Option<PathBuf>, data: &[u8]) -> Result<(), Error> {
    match path {
        Some(p) => std::fs::write(p, data)?,
        None => {
            use std::io::Write;
            std::io::stdout().write_all(data)?;
        }
    }
    Ok(())
}
