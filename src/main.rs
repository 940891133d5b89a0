use std::fs;
use std::io::{self, Read, Write};

use color_eyre::eyre::WrapErr;
use secrecy::ExposeSecret;
use sri_signer::{config::Config, telemetry};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    telemetry::init_tracing();

    let config = Config::load()?;
    tracing::info!("Loaded configuration: {:?}", config);
    let signer = config.signer;

    let document = match &signer.input_path {
        Some(path) => fs::read_to_string(path).wrap_err_with(|| format!("failed to read document {path}"))?,
        None => {
            let mut document = String::new();
            io::stdin().read_to_string(&mut document)?;
            document
        }
    };
    let pkcs12 = fs::read(&signer.pkcs12_path)
        .wrap_err_with(|| format!("failed to read PKCS#12 archive {}", signer.pkcs12_path))?;
    let password = signer.pkcs12_password.as_ref().map(|p| p.expose_secret());

    let signed = sri_signer::sign(&document, &pkcs12, password, signer.document_type.as_deref())?;

    match &signer.output_path {
        Some(path) => fs::write(path, signed).wrap_err_with(|| format!("failed to write {path}"))?,
        None => io::stdout().write_all(signed.as_bytes())?,
    }
    Ok(())
}
