//! Error taxonomy for outbound collaborator calls.
//!
//! Every failure that crosses the resilience layer is a [`PrintError`]
//! tagged with a [`PrintErrorKind`]. Circuit breakers classify failures by
//! comparing kind tags by value, so the kinds are flat, `Copy`, hashable,
//! and serde-friendly so configurations can name them.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for operations in this crate.
pub type PrintResult<T> = Result<T, PrintError>;

/// Error classification tags.
///
/// Deliberately flat: a breaker decides whether a failure counts against
/// its threshold by checking the tag against its configured non-tripping
/// set, never by inspecting a type hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintErrorKind {
    /// Collaborator host refused the TCP connection.
    ConnectionRefused,
    /// Timed out establishing a connection.
    ConnectionTimeout,
    /// Established connection was reset by the peer.
    ConnectionReset,
    /// Collaborator host name did not resolve.
    DnsResolution,
    /// Timed out waiting for a response on an open connection.
    ReadTimeout,
    /// Timed out sending a request.
    WriteTimeout,
    /// Collaborator reported itself unavailable.
    ServiceUnavailable,
    /// Response violated the collaborator's protocol.
    ProtocolError,
    /// Print portal returned a SOAP fault envelope.
    SoapFault,
    /// Printer did not answer an SNMP poll.
    SnmpTimeout,
    /// Print portal rejected the job ticket.
    InvalidJobTicket,
    /// Accounting server refused the job for lack of credit.
    InsufficientCredit,
    /// Accounting server does not know the account.
    AccountNotFound,
    /// Request failed validation.
    ValidationFailed,
    /// Call refused or masked by an open circuit breaker.
    CircuitOpen,
    /// No circuit breaker is registered under the requested name.
    UnknownCircuit,
    /// Invalid configuration.
    Configuration,
    /// Unclassified failure.
    Unknown,
}

impl PrintErrorKind {
    /// Returns true for failures of the transport rather than the payload.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            PrintErrorKind::ConnectionRefused
                | PrintErrorKind::ConnectionTimeout
                | PrintErrorKind::ConnectionReset
                | PrintErrorKind::DnsResolution
                | PrintErrorKind::ReadTimeout
                | PrintErrorKind::WriteTimeout
        )
    }

    /// Returns true for outcomes the collaborator produced on purpose.
    ///
    /// These are the kinds call sites typically register as non-tripping:
    /// an account with no credit says nothing about the health of the
    /// accounting server.
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            PrintErrorKind::InvalidJobTicket
                | PrintErrorKind::InsufficientCredit
                | PrintErrorKind::AccountNotFound
                | PrintErrorKind::ValidationFailed
        )
    }
}

impl fmt::Display for PrintErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            PrintErrorKind::ConnectionRefused => "connection refused",
            PrintErrorKind::ConnectionTimeout => "connection timeout",
            PrintErrorKind::ConnectionReset => "connection reset",
            PrintErrorKind::DnsResolution => "dns resolution failed",
            PrintErrorKind::ReadTimeout => "read timeout",
            PrintErrorKind::WriteTimeout => "write timeout",
            PrintErrorKind::ServiceUnavailable => "service unavailable",
            PrintErrorKind::ProtocolError => "protocol error",
            PrintErrorKind::SoapFault => "soap fault",
            PrintErrorKind::SnmpTimeout => "snmp timeout",
            PrintErrorKind::InvalidJobTicket => "invalid job ticket",
            PrintErrorKind::InsufficientCredit => "insufficient credit",
            PrintErrorKind::AccountNotFound => "account not found",
            PrintErrorKind::ValidationFailed => "validation failed",
            PrintErrorKind::CircuitOpen => "circuit open",
            PrintErrorKind::UnknownCircuit => "unknown circuit",
            PrintErrorKind::Configuration => "configuration error",
            PrintErrorKind::Unknown => "unknown error",
        };
        write!(f, "{}", text)
    }
}

/// Error produced by collaborator calls and by the resilience layer itself.
#[derive(Error, Debug)]
pub struct PrintError {
    /// Error kind.
    kind: PrintErrorKind,
    /// Human-readable message.
    message: String,
    /// Circuit the error crossed, if any.
    circuit: Option<String>,
    /// Underlying cause.
    #[source]
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl PrintError {
    /// Creates a new error.
    pub fn new(kind: PrintErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            circuit: None,
            cause: None,
        }
    }

    /// Tags the error with the circuit it crossed.
    pub fn with_circuit(mut self, circuit: impl Into<String>) -> Self {
        self.circuit = Some(circuit.into());
        self
    }

    /// Sets the underlying cause.
    pub fn with_cause<E: std::error::Error + Send + Sync + 'static>(mut self, cause: E) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Returns the error kind.
    pub fn kind(&self) -> PrintErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the circuit name if the error crossed one.
    pub fn circuit(&self) -> Option<&str> {
        self.circuit.as_deref()
    }

    /// Returns true if this is the open-circuit refusal.
    pub fn is_circuit_open(&self) -> bool {
        self.kind == PrintErrorKind::CircuitOpen
    }

    // Convenience constructors

    /// Creates the refusal returned by an open circuit breaker.
    ///
    /// The cause, when attached, is carried for logging only; callers must
    /// not branch on it.
    pub fn circuit_open(circuit: impl Into<String>) -> Self {
        Self::new(
            PrintErrorKind::CircuitOpen,
            "service temporarily unavailable",
        )
        .with_circuit(circuit)
    }

    /// Creates the lookup failure for an unregistered circuit name.
    pub fn unknown_circuit(circuit: impl Into<String>) -> Self {
        Self::new(
            PrintErrorKind::UnknownCircuit,
            "no circuit breaker registered under this name",
        )
        .with_circuit(circuit)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(PrintErrorKind::Configuration, message)
    }

    /// Creates a connection-refused error.
    pub fn connection_refused(message: impl Into<String>) -> Self {
        Self::new(PrintErrorKind::ConnectionRefused, message)
    }

    /// Creates a service-unavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(PrintErrorKind::ServiceUnavailable, message)
    }

    /// Creates a SOAP fault error.
    pub fn soap_fault(message: impl Into<String>) -> Self {
        Self::new(PrintErrorKind::SoapFault, message)
    }

    /// Creates an SNMP poll timeout error.
    pub fn snmp_timeout(message: impl Into<String>) -> Self {
        Self::new(PrintErrorKind::SnmpTimeout, message)
    }

    /// Creates an insufficient-credit error.
    pub fn insufficient_credit(message: impl Into<String>) -> Self {
        Self::new(PrintErrorKind::InsufficientCredit, message)
    }

    /// Creates an invalid-job-ticket error.
    pub fn invalid_job_ticket(message: impl Into<String>) -> Self {
        Self::new(PrintErrorKind::InvalidJobTicket, message)
    }
}

impl fmt::Display for PrintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(circuit) = &self.circuit {
            write!(f, " (circuit: {})", circuit)?;
        }
        Ok(())
    }
}

impl From<std::io::Error> for PrintError {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::ConnectionRefused => PrintErrorKind::ConnectionRefused,
            std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::ConnectionAborted => {
                PrintErrorKind::ConnectionReset
            }
            std::io::ErrorKind::TimedOut => PrintErrorKind::ConnectionTimeout,
            std::io::ErrorKind::BrokenPipe => PrintErrorKind::WriteTimeout,
            _ => PrintErrorKind::Unknown,
        };
        Self::new(kind, err.to_string()).with_cause(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = PrintError::new(PrintErrorKind::SoapFault, "portal returned a fault");
        assert_eq!(err.to_string(), "soap fault: portal returned a fault");
    }

    #[test]
    fn test_display_includes_circuit() {
        let err = PrintError::circuit_open("accounting");
        assert_eq!(
            err.to_string(),
            "circuit open: service temporarily unavailable (circuit: accounting)"
        );
        assert_eq!(err.circuit(), Some("accounting"));
        assert!(err.is_circuit_open());
    }

    #[test]
    fn test_unknown_circuit_error() {
        let err = PrintError::unknown_circuit("print-portal");
        assert_eq!(err.kind(), PrintErrorKind::UnknownCircuit);
        assert_eq!(err.circuit(), Some("print-portal"));
    }

    #[test]
    fn test_cause_is_preserved_as_source() {
        let inner = PrintError::connection_refused("connect to 10.0.0.5:8443 refused");
        let err = PrintError::circuit_open("accounting").with_cause(inner);

        let source = std::error::Error::source(&err).expect("cause should be retained");
        assert!(source.to_string().contains("connect to 10.0.0.5:8443"));
    }

    #[test]
    fn test_kind_classification() {
        assert!(PrintErrorKind::ConnectionRefused.is_connectivity());
        assert!(PrintErrorKind::ReadTimeout.is_connectivity());
        assert!(!PrintErrorKind::SoapFault.is_connectivity());

        assert!(PrintErrorKind::InsufficientCredit.is_business());
        assert!(PrintErrorKind::InvalidJobTicket.is_business());
        assert!(!PrintErrorKind::SnmpTimeout.is_business());
    }

    #[test]
    fn test_kind_serde_uses_snake_case() {
        let json = serde_json::to_string(&PrintErrorKind::SoapFault).unwrap();
        assert_eq!(json, "\"soap_fault\"");

        let kind: PrintErrorKind = serde_json::from_str("\"insufficient_credit\"").unwrap();
        assert_eq!(kind, PrintErrorKind::InsufficientCredit);
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = PrintError::from(io);
        assert_eq!(err.kind(), PrintErrorKind::ConnectionRefused);
        assert!(std::error::Error::source(&err).is_some());

        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        assert_eq!(PrintError::from(io).kind(), PrintErrorKind::ConnectionTimeout);
    }

    #[test]
    fn test_message_accessor() {
        let err = PrintError::insufficient_credit("balance is 0.00");
        assert_eq!(err.message(), "balance is 0.00");
        assert_eq!(err.circuit(), None);
    }
}
