//! Process exit codes
//!
//! Scripts rely on these values; keep them stable.

/// Exit status of a `zs` invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    /// Bad arguments or invalid query
    UsageError = 2,
    /// Transient network or server failure
    NetworkError = 3,
    /// Missing or rejected credentials
    AuthError = 4,
    NotFound = 5,
    /// Exists check answered "no"
    Absent = 6,
    UnsupportedFeature = 7,
}

impl ExitCode {
    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(ExitCode::Success),
            1 => Some(ExitCode::GeneralError),
            2 => Some(ExitCode::UsageError),
            3 => Some(ExitCode::NetworkError),
            4 => Some(ExitCode::AuthError),
            5 => Some(ExitCode::NotFound),
            6 => Some(ExitCode::Absent),
            7 => Some(ExitCode::UnsupportedFeature),
            _ => None,
        }
    }

    /// Exit code matching an adapter error
    pub fn from_error(error: &zs_core::Error) -> Self {
        Self::from_i32(error.exit_code()).unwrap_or(ExitCode::GeneralError)
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}
