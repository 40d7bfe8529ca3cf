//! Errors raised while parsing or evaluating learner submissions.

use thiserror::Error;

/// Exception classes the interpreter can raise or expose as builtins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Exception,
    SyntaxError,
    NameError,
    TypeError,
    ValueError,
    ZeroDivisionError,
    KeyError,
    IndexError,
    AttributeError,
    OverflowError,
    RecursionError,
    MemoryError,
    AssertionError,
    RuntimeError,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Exception => "Exception",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::NameError => "NameError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ValueError => "ValueError",
            ErrorKind::ZeroDivisionError => "ZeroDivisionError",
            ErrorKind::KeyError => "KeyError",
            ErrorKind::IndexError => "IndexError",
            ErrorKind::AttributeError => "AttributeError",
            ErrorKind::OverflowError => "OverflowError",
            ErrorKind::RecursionError => "RecursionError",
            ErrorKind::MemoryError => "MemoryError",
            ErrorKind::AssertionError => "AssertionError",
            ErrorKind::RuntimeError => "RuntimeError",
        }
    }

    /// Exception classes reachable by name from learner code.
    pub fn from_builtin_name(name: &str) -> Option<Self> {
        let kind = match name {
            "Exception" => ErrorKind::Exception,
            "NameError" => ErrorKind::NameError,
            "TypeError" => ErrorKind::TypeError,
            "ValueError" => ErrorKind::ValueError,
            "ZeroDivisionError" => ErrorKind::ZeroDivisionError,
            "KeyError" => ErrorKind::KeyError,
            "IndexError" => ErrorKind::IndexError,
            "AttributeError" => ErrorKind::AttributeError,
            "AssertionError" => ErrorKind::AssertionError,
            "RuntimeError" => ErrorKind::RuntimeError,
            _ => return None,
        };
        Some(kind)
    }
}

/// Failure of a parse, evaluation, or call.
///
/// `Exit` is the termination signal raised by `exit()`/`quit()`; everything
/// else is an ordinary exception whose `Display` is the learner-facing message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("{message}")]
    Exception { kind: ErrorKind, message: String },
    #[error("exit requested")]
    Exit,
}

pub type EvalResult<T> = Result<T, EvalError>;

impl EvalError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        EvalError::Exception {
            kind,
            message: message.into(),
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SyntaxError, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValueError, message)
    }

    pub fn name_error(name: &str) -> Self {
        Self::new(ErrorKind::NameError, format!("name '{name}' is not defined"))
    }

    pub fn zero_division(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ZeroDivisionError, message)
    }

    pub fn overflow() -> Self {
        Self::new(ErrorKind::OverflowError, "integer overflow")
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            EvalError::Exception { kind, .. } => Some(*kind),
            EvalError::Exit => None,
        }
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, EvalError::Exit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_bare_message() {
        let err = EvalError::zero_division("division by zero");
        assert_eq!(err.to_string(), "division by zero");
        assert_eq!(err.kind(), Some(ErrorKind::ZeroDivisionError));
    }

    #[test]
    fn exit_has_no_kind() {
        assert!(EvalError::Exit.is_exit());
        assert_eq!(EvalError::Exit.kind(), None);
    }

    #[test]
    fn builtin_names_round_trip() {
        let kind = ErrorKind::from_builtin_name("ValueError").expect("known");
        assert_eq!(kind.name(), "ValueError");
        assert!(ErrorKind::from_builtin_name("SyntaxError").is_none());
    }
}
