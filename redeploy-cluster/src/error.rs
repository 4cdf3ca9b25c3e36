use thiserror::Error;

use redeploy_core::ObjectRef;

/// Error surface of a cluster transport.
///
/// `NotFound` and `AlreadyExists` are the two outcomes callers branch on;
/// everything else is an opaque failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("{target} not found")]
    NotFound { target: ObjectRef },

    #[error("{target} already exists")]
    AlreadyExists { target: ObjectRef },

    /// The API server answered with a non-success status.
    #[error("API error {code} ({reason}): {message}")]
    Api {
        code: u16,
        reason: String,
        message: String,
    },

    /// The request never produced an API status (network, TLS, auth setup).
    #[error("connection error: {0}")]
    Connection(String),
}

impl TransportError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TransportError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, TransportError::AlreadyExists { .. })
    }
}

/// Map a `kube` error for `target` onto the transport taxonomy.
pub(crate) fn kube_err(target: &ObjectRef, err: kube::Error) -> TransportError {
    match err {
        kube::Error::Api(resp) if resp.code == 404 => TransportError::NotFound {
            target: target.clone(),
        },
        kube::Error::Api(resp) if resp.code == 409 => TransportError::AlreadyExists {
            target: target.clone(),
        },
        kube::Error::Api(resp) => TransportError::Api {
            code: resp.code,
            reason: resp.reason,
            message: resp.message,
        },
        other => TransportError::Connection(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use kube::error::ErrorResponse;
    use redeploy_core::Namespace;

    use super::*;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".into(),
            message: format!("{reason} happened"),
            reason: reason.into(),
            code,
        })
    }

    #[test]
    fn maps_status_codes() {
        let target = ObjectRef::deployment(&Namespace::from("default"), "nginx");
        assert!(kube_err(&target, api_error(404, "NotFound")).is_not_found());
        assert!(kube_err(&target, api_error(409, "AlreadyExists")).is_already_exists());
        assert_eq!(
            kube_err(&target, api_error(403, "Forbidden")),
            TransportError::Api {
                code: 403,
                reason: "Forbidden".into(),
                message: "Forbidden happened".into(),
            }
        );
    }

    #[test]
    fn display_names_the_target() {
        let target = ObjectRef::service(&Namespace::from("default"), "nginx");
        let err = TransportError::AlreadyExists { target };
        assert_eq!(err.to_string(), "service/default/nginx already exists");
    }
}
