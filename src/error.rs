//! Application error type.
//!
//! One error type for the whole binary: an exit code plus a human-readable
//! message. The taxonomy is deliberately small:
//!
//! - `2` — bad input or configuration (unreadable CSV, missing column, bad flag)
//! - `4` — runtime failure (terminal setup, export write, render)
//!
//! Row-level ingest problems are *values* (`io::ingest::RowError`), never
//! errors: a malformed date or number coerces to null and processing continues.

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Bad input or configuration (exit code 2).
    pub fn input(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    /// Runtime failure (exit code 4).
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(4, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
