//! Follow targets from viewer query parameters.
//!
//! `?follow_player=<uuid>` follows by identifier, `?follow_player_name=<name>`
//! by alias. The identifier wins when both are present.

use reqwest::Url;

use crate::error::ValidationError;

/// Query parameter carrying an identifier.
pub const IDENTIFIER_PARAM: &str = "follow_player";

/// Query parameter carrying an alias.
pub const ALIAS_PARAM: &str = "follow_player_name";

/// What the caller asked to follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowTarget {
    /// Identifier, dashed or undashed.
    Identifier(String),
    /// Alias, any casing.
    Alias(String),
}

impl FollowTarget {
    /// Target from decoded query pairs. Blank values count as absent.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Option<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut alias = None;
        for (key, value) in pairs {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                IDENTIFIER_PARAM => return Some(Self::Identifier(value.to_string())),
                ALIAS_PARAM if alias.is_none() => alias = Some(Self::Alias(value.to_string())),
                _ => {}
            }
        }
        alias
    }

    /// Target from a full viewer URL.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidUrl` if `url` does not parse.
    pub fn from_url(url: &str) -> Result<Option<Self>, ValidationError> {
        let parsed = Url::parse(url).map_err(|e| ValidationError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_query_pairs(parsed.query_pairs()))
    }

    /// Raw input handed to the orchestrator.
    #[must_use]
    pub fn input(&self) -> &str {
        match self {
            Self::Identifier(s) | Self::Alias(s) => s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_takes_precedence() {
        let target = FollowTarget::from_query_pairs([
            ("follow_player_name", "Rin"),
            ("follow_player", "0123456789abcdef0123456789abcdef"),
        ]);
        assert_eq!(
            target,
            Some(FollowTarget::Identifier("0123456789abcdef0123456789abcdef".to_string()))
        );
    }

    #[test]
    fn alias_only() {
        let target = FollowTarget::from_query_pairs([("zoom", "3"), ("follow_player_name", " Rin ")]);
        assert_eq!(target, Some(FollowTarget::Alias("Rin".to_string())));
        assert_eq!(target.unwrap().input(), "Rin");
    }

    #[test]
    fn nothing_to_follow() {
        assert_eq!(FollowTarget::from_query_pairs(Vec::<(String, String)>::new()), None);
        assert_eq!(FollowTarget::from_query_pairs([("follow_player", "  ")]), None);
    }

    #[test]
    fn from_url_decodes_query() {
        let target = FollowTarget::from_url(
            "https://map.example.com/?follow_player=01234567-89ab-cdef-0123-456789abcdef#world:0:0",
        )
        .unwrap();
        assert_eq!(
            target,
            Some(FollowTarget::Identifier("01234567-89ab-cdef-0123-456789abcdef".to_string()))
        );

        let target = FollowTarget::from_url("https://map.example.com/?follow_player_name=Big%20Rin").unwrap();
        assert_eq!(target, Some(FollowTarget::Alias("Big Rin".to_string())));

        assert!(FollowTarget::from_url("https://map.example.com/").unwrap().is_none());
        assert!(matches!(
            FollowTarget::from_url("not a url"),
            Err(ValidationError::InvalidUrl { .. })
        ));
    }
}
