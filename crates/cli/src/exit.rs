//! Process exit codes

use doctor_lib::{DiagnosticError, ErrorKind};

pub const SUCCESS: u8 = 0;
/// Internal failures and errors without a dedicated code
pub const GENERIC_ERROR: u8 = 1;
pub const PERMISSION_DENIED: u8 = 2;
pub const NOT_FOUND: u8 = 3;
pub const TIMEOUT: u8 = 4;
pub const INVALID_INPUT: u8 = 5;
/// `check` completed and found problems
pub const ISSUES_FOUND: u8 = 6;

/// Exit code for a failed analysis
pub fn for_error(err: &DiagnosticError) -> u8 {
    match err.kind() {
        ErrorKind::NoIssueDetected => SUCCESS,
        ErrorKind::PermissionDenied => PERMISSION_DENIED,
        ErrorKind::NotFound => NOT_FOUND,
        ErrorKind::Timeout => TIMEOUT,
        ErrorKind::InvalidInput => INVALID_INPUT,
        ErrorKind::InvariantViolation | ErrorKind::Cluster => GENERIC_ERROR,
    }
}
