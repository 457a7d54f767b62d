use std::fmt;

/// Terminal status of a process.
///
/// A process exits either with a code or because of a signal. Nonzero
/// codes are ordinary outcomes; callers decide which ones matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    code: Option<i32>,
    signal: Option<i32>,
}

impl ExitStatus {
    pub const fn new(code: Option<i32>, signal: Option<i32>) -> Self {
        Self { code, signal }
    }

    pub const fn from_code(code: i32) -> Self {
        Self::new(Some(code), None)
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn code(&self) -> Option<i32> {
        self.code
    }

    pub fn signal(&self) -> Option<i32> {
        self.signal
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self::new(status.code(), signal)
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {}", code),
            (None, Some(signal)) => write!(f, "signal {}", signal),
            (None, None) => f.write_str("unknown status"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_only_for_zero_code() {
        assert!(ExitStatus::from_code(0).success());
        assert!(!ExitStatus::from_code(1).success());
        assert!(!ExitStatus::new(None, Some(15)).success());
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitStatus::from_code(2).to_string(), "exit code 2");
        assert_eq!(ExitStatus::new(None, Some(9)).to_string(), "signal 9");
        assert_eq!(ExitStatus::new(None, None).to_string(), "unknown status");
    }
}
