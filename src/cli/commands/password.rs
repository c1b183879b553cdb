use serde_json::json;

use crate::auth::hash_password;
use crate::cli::OutputFormat;

pub fn handle(password: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    if password.is_empty() {
        anyhow::bail!("password must not be empty");
    }
    let hash = hash_password(password)?;

    match output_format {
        OutputFormat::Json => println!("{}", json!({ "password_hash": hash })),
        OutputFormat::Text => println!("{}", hash),
    }
    Ok(())
}
