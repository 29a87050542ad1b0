//! API and transfer token validation
//!
//! Tokens are the non-interactive principals. A `custom` API token stores
//! an explicit list of permitted action strings; that list is re-validated
//! against the live action set at creation and update time, so a token can
//! never smuggle a stale or made-up action past the registry. Lifespans are
//! restricted to a fixed menu, or unlimited.

use std::collections::HashSet;

use castellan_core::{EngineError, Result};
use castellan_domain::Permission;
use serde::{Deserialize, Serialize};

/// Seven days, in milliseconds
pub const DAYS_7: i64 = 7 * 24 * 60 * 60 * 1000;

/// Thirty days, in milliseconds
pub const DAYS_30: i64 = 30 * 24 * 60 * 60 * 1000;

/// Ninety days, in milliseconds
pub const DAYS_90: i64 = 90 * 24 * 60 * 60 * 1000;

/// The only lifespans a token may carry, besides unlimited (`None`)
pub const ALLOWED_LIFESPANS: &[i64] = &[DAYS_7, DAYS_30, DAYS_90];

/// Access level of an API token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenType {
    /// Read operations only (`find` / `findOne`)
    ReadOnly,
    /// Every content API action
    FullAccess,
    /// Exactly the stored permission list, nothing else
    Custom,
}

/// Direction a transfer token is allowed to move data in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransferTokenPermission {
    /// Send data to the remote
    Push,
    /// Receive data from the remote
    Pull,
    /// Both directions
    PushPull,
}

/// A long-lived API token record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiToken {
    /// Database id, absent before creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Unique display name
    pub name: String,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Access level
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Validity window in milliseconds, `None` for unlimited
    #[serde(default)]
    pub lifespan: Option<i64>,
    /// Permitted action strings; only meaningful for `Custom` tokens
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// A data transfer token record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferToken {
    /// Database id, absent before creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Unique display name
    pub name: String,
    /// Granted transfer directions
    pub permissions: Vec<TransferTokenPermission>,
    /// Validity window in milliseconds, `None` for unlimited
    #[serde(default)]
    pub lifespan: Option<i64>,
}

/// Reject lifespans outside the allowed set.
///
/// `None` means unlimited and is always accepted.
pub fn validate_lifespan(lifespan: Option<i64>) -> Result<()> {
    match lifespan {
        None => Ok(()),
        Some(value) if ALLOWED_LIFESPANS.contains(&value) => Ok(()),
        Some(_) => {
            let allowed = ALLOWED_LIFESPANS
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            Err(EngineError::validation(format!(
                "lifespan must be one of the following values: {allowed}"
            )))
        }
    }
}

/// Re-validate a stored custom permission list against the live action set.
///
/// Every action string must be currently valid; offenders are listed in the
/// error so the caller can surface them verbatim.
pub fn validate_custom_permissions(
    valid_actions: &HashSet<String>,
    permissions: &[String],
) -> Result<()> {
    let unknown: Vec<&str> = permissions
        .iter()
        .filter(|action| !valid_actions.contains(*action))
        .map(String::as_str)
        .collect();
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(EngineError::validation(format!(
            "Unknown permissions provided: {}",
            unknown.join(", ")
        )))
    }
}

/// Expand a token into the engine permissions it grants.
///
/// `Custom` tokens carry their stored list verbatim; `ReadOnly` and
/// `FullAccess` derive theirs from the live content API action set, so a
/// token automatically tracks actions added or removed after its creation.
pub fn permissions_for_token(token: &ApiToken, content_api_actions: &[String]) -> Vec<Permission> {
    let actions: Vec<&str> = match token.token_type {
        TokenType::Custom => token.permissions.iter().map(String::as_str).collect(),
        TokenType::FullAccess => content_api_actions.iter().map(String::as_str).collect(),
        TokenType::ReadOnly => content_api_actions
            .iter()
            .map(String::as_str)
            .filter(|action| is_read_action(action))
            .collect(),
    };
    actions.into_iter().map(Permission::new).collect()
}

fn is_read_action(action: &str) -> bool {
    matches!(action.rsplit('.').next(), Some("find" | "findOne"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn content_api_actions() -> Vec<String> {
        [
            "api::article.article.find",
            "api::article.article.findOne",
            "api::article.article.create",
            "api::article.article.delete",
        ]
        .into_iter()
        .map(str::to_string)
        .collect()
    }

    fn token(token_type: TokenType, permissions: Vec<&str>) -> ApiToken {
        ApiToken {
            id: None,
            name: "ci".to_string(),
            description: None,
            token_type,
            lifespan: None,
            permissions: permissions.into_iter().map(str::to_string).collect(),
        }
    }

    #[test]
    fn allowed_lifespans_and_unlimited_are_accepted() {
        assert!(validate_lifespan(None).is_ok());
        for lifespan in ALLOWED_LIFESPANS {
            assert!(validate_lifespan(Some(*lifespan)).is_ok());
        }
    }

    #[test]
    fn negative_lifespan_is_rejected_before_any_row_exists() {
        let error = validate_lifespan(Some(-1)).unwrap_err();
        assert_matches!(&error, EngineError::Validation { message }
            if message.contains("lifespan must be one of the following values"));
    }

    #[test]
    fn arbitrary_lifespan_is_rejected() {
        assert!(validate_lifespan(Some(1)).is_err());
        assert!(validate_lifespan(Some(DAYS_7 + 1)).is_err());
    }

    #[test]
    fn custom_permissions_must_all_be_live_actions() {
        let valid: HashSet<String> = content_api_actions().into_iter().collect();
        let stored = vec![
            "api::article.article.find".to_string(),
            "api::article.article.publish".to_string(),
            "plugin::upload.content-api.upload".to_string(),
        ];
        let error = validate_custom_permissions(&valid, &stored).unwrap_err();
        assert_matches!(&error, EngineError::Validation { message }
            if message == "Unknown permissions provided: api::article.article.publish, plugin::upload.content-api.upload");

        let stored = vec!["api::article.article.delete".to_string()];
        assert!(validate_custom_permissions(&valid, &stored).is_ok());
    }

    #[test]
    fn read_only_tokens_expand_to_read_actions() {
        let permissions = permissions_for_token(
            &token(TokenType::ReadOnly, vec![]),
            &content_api_actions(),
        );
        let actions: Vec<&str> = permissions.iter().map(|p| p.action.as_str()).collect();
        assert_eq!(
            actions,
            vec!["api::article.article.find", "api::article.article.findOne"]
        );
    }

    #[test]
    fn full_access_tokens_expand_to_every_action() {
        let permissions = permissions_for_token(
            &token(TokenType::FullAccess, vec!["ignored"]),
            &content_api_actions(),
        );
        assert_eq!(permissions.len(), content_api_actions().len());
    }

    #[test]
    fn custom_tokens_carry_their_stored_list_verbatim() {
        let permissions = permissions_for_token(
            &token(TokenType::Custom, vec!["api::article.article.delete"]),
            &content_api_actions(),
        );
        assert_eq!(permissions.len(), 1);
        assert_eq!(permissions[0].action, "api::article.article.delete");
        assert!(permissions[0].conditions.is_empty());
    }

    #[test]
    fn token_types_serialize_in_kebab_case() {
        assert_eq!(json!(TokenType::ReadOnly), json!("read-only"));
        assert_eq!(json!(TokenType::FullAccess), json!("full-access"));
        assert_eq!(json!(TransferTokenPermission::PushPull), json!("push-pull"));

        let parsed: ApiToken = serde_json::from_value(json!({
            "name": "reader",
            "type": "read-only",
            "lifespan": DAYS_30,
        }))
        .unwrap();
        assert_eq!(parsed.token_type, TokenType::ReadOnly);
        assert_eq!(parsed.lifespan, Some(DAYS_30));
    }
}
