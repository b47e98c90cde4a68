use crate::core_types::{GraphQlError, RawError};
use crate::graphql::{is_auth_failure, operation_name};

#[cfg(test)]
mod tests {
    use super::*;

    // Unit Tests for GraphQL helpers
    //
    // UNIT UNDER TEST: operation_name and is_auth_failure
    //
    // BUSINESS RESPONSIBILITY:
    //   - Names the failing operation in error context metadata
    //   - Detects auth-class failures that clear the credential store
    //
    // TEST COVERAGE:
    //   - Named and anonymous documents
    //   - Auth detection by code in any entry and by status

    #[test]
    fn test_operation_name_from_named_documents() {
        assert_eq!(
            operation_name("query Viewer { viewer { id } }").as_deref(),
            Some("Viewer")
        );
        assert_eq!(
            operation_name("\n  mutation UpdateProfile($input: ProfileInput!) { ok }").as_deref(),
            Some("UpdateProfile")
        );
        assert_eq!(
            operation_name("subscription OnMessage { message { id } }").as_deref(),
            Some("OnMessage")
        );
    }

    #[test]
    fn test_anonymous_documents_have_no_name() {
        assert_eq!(operation_name("{ viewer { id } }"), None);
        assert_eq!(operation_name("query { viewer { id } }"), None);
    }

    #[test]
    fn test_auth_failure_detected_in_any_entry() {
        // Arrange
        let raw = RawError::graphql(
            200,
            vec![
                GraphQlError::new("Bad input").with_code("BAD_USER_INPUT"),
                GraphQlError::new("Not signed in").with_code("UNAUTHENTICATED"),
            ],
        );

        // Act & Assert
        assert!(is_auth_failure(&raw));
    }

    #[test]
    fn test_auth_failure_by_status_and_negative_cases() {
        assert!(is_auth_failure(&RawError::graphql(401, Vec::new())));
        assert!(!is_auth_failure(&RawError::graphql(
            200,
            vec![GraphQlError::new("boom").with_code("INTERNAL_SERVER_ERROR")]
        )));
        assert!(!is_auth_failure(&RawError::timeout("timed out")));
    }
}
