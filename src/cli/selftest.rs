//! Connectivity self-test
//!
//! Sends one benign scan and reports whether credentials, TLS and the
//! response contract all work. The exit code distinguishes the failure class.

use colored::Colorize;

use crate::cli::args::GlobalOptions;
use crate::cli::CommandContext;
use crate::error::{Error, ErrorKind, Result};

/// Run the self-test
pub async fn run(opts: &GlobalOptions) -> Result<()> {
    println!("\n{}", "Testing Prisma AIRS connection...".bold());

    let ctx = CommandContext::new(opts)?;
    println!("   TLS mode: {}", ctx.transport.strategy.to_string().cyan());
    println!("   Endpoint: {}", ctx.config.credentials.base_url.cyan());
    println!("   Profile:  {}", ctx.config.credentials.profile);

    match ctx.service.scan_single(Some("test"), Some("test")).await {
        Ok(result) => {
            println!("{} Connection successful!", "✓".green());
            println!("   Scan ID: {}", result.scan_id);
            println!("   Verdict: {}", result.verdict.as_str());
            println!("   Action:  {}", result.action.as_str());
            Ok(())
        }
        Err(err) => {
            eprintln!(
                "{} Connection failed ({})",
                "✗".red(),
                failure_cause(&err)
            );
            Err(err)
        }
    }
}

/// Short label for the class of failure
pub fn failure_cause(err: &Error) -> &'static str {
    match err.kind() {
        ErrorKind::Auth => "authentication failure",
        ErrorKind::Transport => "network failure",
        ErrorKind::Rejected => "request rejected",
        ErrorKind::MalformedResponse => "malformed response",
        ErrorKind::Tls => "TLS failure",
        ErrorKind::Config => "configuration error",
        ErrorKind::Validation | ErrorKind::Unimplemented | ErrorKind::Internal => {
            "unexpected error"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;

    #[test]
    fn test_failure_causes_are_distinct() {
        let auth: Error = ApiError::Unauthorized.into();
        let network: Error = ApiError::Transport {
            attempts: 4,
            cause: "Request timed out".into(),
        }
        .into();
        let malformed: Error = ApiError::MalformedResponse("missing field 'scan_id'".into()).into();
        let rejected: Error = ApiError::Rejected {
            status: 400,
            message: "profile not found".into(),
        }
        .into();

        assert_eq!(failure_cause(&auth), "authentication failure");
        assert_eq!(failure_cause(&network), "network failure");
        assert_eq!(failure_cause(&malformed), "malformed response");
        assert_eq!(failure_cause(&rejected), "request rejected");
    }
}
