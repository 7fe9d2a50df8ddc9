//! Envelope signing boundary wiring
//!
//! Key material never enters this process. Live runs delegate signing to an
//! external command (a hardware wallet bridge, a cosigning helper, or a
//! small SDK script): the payment and source sequence number go in as JSON
//! on stdin, the signed base64 envelope comes back on stdout.

use std::io::Write;
use std::process::{Command, Stdio};

use lib_stellar::{PaymentRequest, SignedEnvelope, StellarError, TransactionSigner};

/// Signer that shells out to a configured command.
pub struct CommandSigner {
    command: String,
}

impl CommandSigner {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl TransactionSigner for CommandSigner {
    fn sign_payment(
        &self,
        request: &PaymentRequest,
        sequence: u64,
    ) -> lib_stellar::Result<SignedEnvelope> {
        let payload = serde_json::json!({
            "payment": request,
            "sequence": sequence,
        });
        let payload = payload.to_string();

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| StellarError::Signing(format!("failed to start signer: {e}")))?;

        child
            .stdin
            .take()
            .ok_or_else(|| StellarError::Signing("signer stdin unavailable".to_string()))?
            .write_all(payload.as_bytes())
            .map_err(|e| StellarError::Signing(format!("failed to write to signer: {e}")))?;

        let output = child
            .wait_with_output()
            .map_err(|e| StellarError::Signing(format!("signer did not finish: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StellarError::Signing(format!(
                "signer exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let envelope = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if envelope.is_empty() {
            return Err(StellarError::Signing(
                "signer produced an empty envelope".to_string(),
            ));
        }
        Ok(SignedEnvelope(envelope))
    }
}

/// Signer for read-only wiring. Validation never submits payments, so this
/// only fires if something is miswired.
pub struct NoSigner;

impl TransactionSigner for NoSigner {
    fn sign_payment(
        &self,
        _request: &PaymentRequest,
        _sequence: u64,
    ) -> lib_stellar::Result<SignedEnvelope> {
        Err(StellarError::Signing(
            "no signer configured; set signer_command for live distribution".to_string(),
        ))
    }
}
