//! Response validation.

use crate::custody::types::{CustodyError, CustodyResponse, CustodyResult, ReturnedSignature};

/// Take the first returned signature, or fail if signing did not complete.
///
/// An absent or empty list means the custody service could not finish within
/// the wait window (approval pending, rejected, or expired). A first entry that
/// is empty (`null`, `""`, `{}`) counts as missing too.
pub fn validate(response: CustodyResponse) -> CustodyResult<ReturnedSignature> {
    let first = response
        .signatures
        .and_then(|signatures| signatures.into_iter().next())
        .filter(|signature| !signature.is_empty());

    match first {
        Some(signature) => Ok(signature),
        None => {
            tracing::warn!(
                transaction_id = ?response.id,
                state = ?response.state,
                "Signature not returned from custody service"
            );
            Err(CustodyError::MissingSignature)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sig(data: &str) -> ReturnedSignature {
        ReturnedSignature(json!({ "data": data }))
    }

    #[test]
    fn test_empty_signatures() {
        let response = CustodyResponse {
            signatures: Some(Vec::new()),
            ..CustodyResponse::default()
        };
        assert!(matches!(validate(response), Err(CustodyError::MissingSignature)));
    }

    #[test]
    fn test_absent_signatures() {
        let response = CustodyResponse {
            state: Some("waiting_for_approval".into()),
            ..CustodyResponse::default()
        };
        assert!(matches!(validate(response), Err(CustodyError::MissingSignature)));
    }

    #[test]
    fn test_empty_first_signature() {
        for first in [json!(null), json!(""), json!({}), json!(false)] {
            let response = CustodyResponse {
                signatures: Some(vec![ReturnedSignature(first.clone()), sig("sig2")]),
                ..CustodyResponse::default()
            };
            assert!(
                matches!(validate(response), Err(CustodyError::MissingSignature)),
                "accepted {}",
                first
            );
        }
    }

    #[test]
    fn test_empty_first_signature_from_wire() {
        for body in [r#"{"signatures":[null]}"#, r#"{"signatures":[""]}"#] {
            let response: CustodyResponse = serde_json::from_str(body).unwrap();
            assert!(matches!(validate(response), Err(CustodyError::MissingSignature)));
        }
    }

    #[test]
    fn test_non_object_signature_is_returned() {
        let response = CustodyResponse {
            signatures: Some(vec![ReturnedSignature(json!("c2ln"))]),
            ..CustodyResponse::default()
        };
        assert_eq!(validate(response).unwrap(), ReturnedSignature(json!("c2ln")));
    }

    #[test]
    fn test_returns_first_signature() {
        let response = CustodyResponse {
            signatures: Some(vec![sig("sig1"), sig("sig2")]),
            ..CustodyResponse::default()
        };
        let first = validate(response).unwrap();
        assert_eq!(first, sig("sig1"));
    }
}
