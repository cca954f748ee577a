// Unit Tests for Failure Classification
//
// UNIT UNDER TEST: Classifier
//
// BUSINESS RESPONSIBILITY:
//   - Assigns every failure exactly one category, severity and recoverability flag
//   - Treats offline hosts and transport failures as recoverable network errors
//   - Separates authentication (401) and authorization (403) from other client errors
//   - Escalates server errors (5xx) and caller-flagged failures to critical
//   - Never fails, even for failures with no name, message or status
//
// TEST COVERAGE:
//   - Rule precedence: network → auth → server → validation → client → unknown
//   - Network detection by kind, name and message pattern
//   - Auth recoverability policy extension point
//   - Empty failures defaulting to unknown/warning/non-recoverable

use crate::classifier::{classify, Classifier};
use crate::config::ClassifierPolicy;
use crate::core_types::{ErrorCategory, ErrorSeverity, Failure, FailureKind};

#[cfg(test)]
mod network_classification_tests {
    use super::*;

    #[test]
    fn test_offline_host_classifies_any_failure_as_network() {
        // Test verifies that a host reporting offline turns even a generic failure
        // into a recoverable network error

        // Arrange
        let failure = Failure::new("offline");

        // Act
        let classification = classify(&failure, false);

        // Assert
        assert_eq!(classification.category, ErrorCategory::Network);
        assert_eq!(classification.severity, ErrorSeverity::Warning);
        assert!(
            classification.recoverable,
            "Network errors should be recoverable"
        );
    }

    #[test]
    fn test_offline_takes_precedence_over_server_status() {
        // Test verifies rule order: network detection runs before status rules

        // Arrange
        let failure = Failure::http(503, "Service Unavailable");

        // Act
        let classification = classify(&failure, false);

        // Assert
        assert_eq!(classification.category, ErrorCategory::Network);
    }

    #[test]
    fn test_network_names_classify_as_network() {
        // Test verifies fetch-style error names map to network

        for name in ["NetworkError", "TimeoutError", "AbortError"] {
            // Arrange
            let failure = Failure::named(name, "request did not complete");

            // Act
            let classification = classify(&failure, true);

            // Assert
            assert_eq!(
                classification.category,
                ErrorCategory::Network,
                "{name} should classify as network"
            );
        }
    }

    #[test]
    fn test_network_message_pattern_matches_fetch_failures() {
        // Test verifies transport messages are recognised without a name or kind

        // Arrange
        let failure = Failure::new("TypeError: Failed to fetch");

        // Act
        let classification = classify(&failure, true);

        // Assert
        assert_eq!(classification.category, ErrorCategory::Network);
        assert!(classification.recoverable);
    }

    #[test]
    fn test_message_pattern_ignored_when_server_answered() {
        // Test verifies a gateway timeout with a status is a server error,
        // not a transport error, even though its message mentions a timeout

        // Arrange
        let failure = Failure::http(504, "Gateway timed out");

        // Act
        let classification = classify(&failure, true);

        // Assert
        assert_eq!(classification.category, ErrorCategory::Server);
    }

    #[test]
    fn test_timeout_and_aborted_kinds_classify_as_network() {
        // Arrange
        let timeout = Failure::timeout("deadline elapsed");
        let aborted = Failure::new("stopped").with_kind(FailureKind::Aborted);

        // Act & Assert
        assert_eq!(classify(&timeout, true).category, ErrorCategory::Network);
        assert_eq!(classify(&aborted, true).category, ErrorCategory::Network);
    }
}

#[cfg(test)]
mod status_classification_tests {
    use super::*;

    #[test]
    fn test_unauthorized_is_non_recoverable_authentication() {
        // Test verifies 401 maps to authentication and is not retried by default

        // Arrange
        let failure = Failure::http(401, "Unauthorized");

        // Act
        let classification = classify(&failure, true);

        // Assert
        assert_eq!(classification.category, ErrorCategory::Authentication);
        assert_eq!(classification.severity, ErrorSeverity::Warning);
        assert!(
            !classification.recoverable,
            "Authentication errors should not be recoverable by default"
        );
    }

    #[test]
    fn test_forbidden_is_non_recoverable_authorization() {
        // Arrange
        let failure = Failure::http(403, "Forbidden");

        // Act
        let classification = classify(&failure, true);

        // Assert
        assert_eq!(classification.category, ErrorCategory::Authorization);
        assert!(!classification.recoverable);
    }

    #[test]
    fn test_auth_policy_makes_auth_errors_recoverable() {
        // Test verifies the policy hook for hosts that wire in a token refresh

        // Arrange
        let classifier = Classifier::new(ClassifierPolicy {
            auth_recoverable: true,
        });

        // Act
        let unauthorized = classifier.classify(&Failure::http(401, "Unauthorized"), true);
        let forbidden = classifier.classify(&Failure::http(403, "Forbidden"), true);

        // Assert
        assert!(unauthorized.recoverable);
        assert!(forbidden.recoverable);
        assert_eq!(unauthorized.category, ErrorCategory::Authentication);
    }

    #[test]
    fn test_server_errors_are_critical_and_recoverable() {
        for status in [500, 502, 503, 599] {
            // Arrange
            let failure = Failure::http(status, "upstream failure");

            // Act
            let classification = classify(&failure, true);

            // Assert
            assert_eq!(classification.category, ErrorCategory::Server, "status {status}");
            assert_eq!(classification.severity, ErrorSeverity::Critical);
            assert!(classification.recoverable);
        }
    }

    #[test]
    fn test_other_client_errors_are_non_recoverable_warnings() {
        // Arrange
        let failure = Failure::http(404, "Not Found");

        // Act
        let classification = classify(&failure, true);

        // Assert
        assert_eq!(classification.category, ErrorCategory::Client);
        assert_eq!(classification.severity, ErrorSeverity::Warning);
        assert!(!classification.recoverable);
    }

    #[test]
    fn test_validation_wins_over_client_status() {
        // Test verifies a 422 carrying a validation failure is reported as validation

        // Arrange
        let failure = Failure::validation("email is invalid").with_status(422);

        // Act
        let classification = classify(&failure, true);

        // Assert
        assert_eq!(classification.category, ErrorCategory::Validation);
        assert!(!classification.recoverable);
    }
}

#[cfg(test)]
mod fallback_classification_tests {
    use super::*;

    #[test]
    fn test_validation_names_classify_as_validation() {
        for name in ["ValidationError", "ZodError", "SyntaxError"] {
            // Arrange
            let failure = Failure::named(name, "bad input");

            // Act & Assert
            assert_eq!(
                classify(&failure, true).category,
                ErrorCategory::Validation,
                "{name} should classify as validation"
            );
        }
    }

    #[test]
    fn test_empty_failure_defaults_to_unknown_warning() {
        // Test verifies classification never fails for an empty failure

        // Arrange
        let failure = Failure::named("", "");

        // Act
        let classification = classify(&failure, true);

        // Assert
        assert_eq!(classification.category, ErrorCategory::Unknown);
        assert_eq!(classification.severity, ErrorSeverity::Warning);
        assert!(!classification.recoverable);
    }

    #[test]
    fn test_critical_flag_escalates_severity_without_changing_category() {
        // Arrange
        let failure = Failure::new("state corrupted").critical();

        // Act
        let classification = classify(&failure, true);

        // Assert
        assert_eq!(classification.category, ErrorCategory::Unknown);
        assert_eq!(classification.severity, ErrorSeverity::Critical);
    }
}
