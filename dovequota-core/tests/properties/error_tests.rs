//! Property tests for transport failure classification and error mapping

use dovequota_core::client::classify_ssh_failure;
use dovequota_core::{ClientError, ParseError, RefreshCause, RefreshError};
use proptest::prelude::*;

/// stderr text that never mentions an authentication failure
fn neutral_stderr_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("ssh: connect to host mail port 22: Connection refused".to_string()),
        Just("ssh: Could not resolve hostname mail: Name or service not known".to_string()),
        "[a-z ]{0,40}",
    ]
}

proptest! {
    /// Property: any exit status other than the transport codes means the
    /// session worked, so no error is raised
    #[test]
    fn remote_exit_codes_are_not_transport_errors(
        code in (0i32..255).prop_filter("sshpass codes", |c| *c != 5 && *c != 6),
        stderr in "[ -~]{0,60}",
        via_sshpass in any::<bool>(),
    ) {
        prop_assert!(classify_ssh_failure("mail", "admin", Some(code), &stderr, via_sshpass).is_none());
    }

    /// Property: exit 255 without an auth marker is a connection failure
    #[test]
    fn ssh_error_without_marker_is_connection(
        stderr in neutral_stderr_strategy(),
        via_sshpass in any::<bool>(),
    ) {
        let err = classify_ssh_failure("mail", "admin", Some(255), &stderr, via_sshpass);
        let is_connection = matches!(err, Some(ClientError::Connection { ref host, .. }) if host == "mail");
        prop_assert!(is_connection);
    }

    /// Property: exit 255 with "Permission denied" is an authentication failure
    #[test]
    fn ssh_error_with_marker_is_authentication(
        prefix in "[a-z@.]{0,20}",
        via_sshpass in any::<bool>(),
    ) {
        let stderr = format!("{prefix}: Permission denied (publickey,password).");
        let err = classify_ssh_failure("mail", "admin", Some(255), &stderr, via_sshpass).unwrap();
        prop_assert!(err.is_authentication());
        prop_assert_eq!(err.reason_key(), "invalid_auth");
    }

    /// Property: refresh errors keep their client cause whatever the stage
    #[test]
    fn refresh_error_preserves_client_cause(
        reason in "[a-z ]{1,30}",
        setup in any::<bool>(),
    ) {
        let client = ClientError::Connection { host: "mail".into(), reason };
        let cause = RefreshCause::from(client.clone());
        let err = if setup {
            RefreshError::Setup(cause)
        } else {
            RefreshError::Failed(cause)
        };
        prop_assert_eq!(err.client_error(), Some(&client));
        prop_assert_eq!(err.clone(), err);
    }
}

#[test]
fn sshpass_exit_codes() {
    let err = classify_ssh_failure("mail", "admin", Some(5), "", true).unwrap();
    assert_eq!(err.reason_key(), "invalid_auth");

    let err = classify_ssh_failure("mail", "admin", Some(6), "", true).unwrap();
    assert_eq!(err.reason_key(), "cannot_connect");

    // Without sshpass these codes belong to the remote command
    assert!(classify_ssh_failure("mail", "admin", Some(5), "", false).is_none());
}

#[test]
fn killed_by_signal_is_connection() {
    let err = classify_ssh_failure("mail", "admin", None, "", false).unwrap();
    assert!(matches!(err, ClientError::Connection { .. }));
}

#[test]
fn parse_cause_has_no_client_error() {
    let err = RefreshError::Failed(ParseError::malformed("x", "bad").into());
    assert!(err.client_error().is_none());
    assert!(err.to_string().contains("Malformed quota record 'x'"));
}
