/// Query string parameters
///
/// `axum::extract::Query` cannot collect repeated keys (`?tags=a&tags=b`),
/// so list endpoints take the raw query and read it through [`QueryParams`].

use axum::{
    async_trait,
    extract::{FromRequestParts, RawQuery},
    http::request::Parts,
};
use std::convert::Infallible;

/// Parsed query string, preserving order and repeated keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Parses an `application/x-www-form-urlencoded` query string
    pub fn parse(query: Option<&str>) -> Self {
        let pairs = query
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();

        Self { pairs }
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `key`, in order
    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// First value for `key` parsed as an integer; unparsable values are ignored
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    /// `0`/`1` (or `false`/`true`) flag
    pub fn get_flag(&self, key: &str) -> Option<bool> {
        match self.get(key)?.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        }
    }

    /// All pairs, in order
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RawQuery(query) = RawQuery::from_request_parts(parts, state).await?;
        Ok(Self::parse(query.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_keys_are_kept() {
        let params = QueryParams::parse(Some("tags=breakfast&page=2&tags=lunch"));
        assert_eq!(params.get_all("tags"), vec!["breakfast", "lunch"]);
        assert_eq!(params.get_i64("page"), Some(2));
    }

    #[test]
    fn test_percent_decoding() {
        let params = QueryParams::parse(Some("name=%D1%81%D0%BE%D0%BB%D1%8C"));
        assert_eq!(params.get("name"), Some("соль"));
    }

    #[test]
    fn test_flags() {
        let params = QueryParams::parse(Some("is_favorited=1&is_in_shopping_cart=0&x=maybe"));
        assert_eq!(params.get_flag("is_favorited"), Some(true));
        assert_eq!(params.get_flag("is_in_shopping_cart"), Some(false));
        assert_eq!(params.get_flag("x"), None);
        assert_eq!(params.get_flag("missing"), None);
    }

    #[test]
    fn test_empty_query() {
        let params = QueryParams::parse(None);
        assert!(params.pairs().is_empty());
        assert_eq!(params.get("page"), None);
    }
}
