use crate::error::{RegistryError, Result};

/// `link` レスポンスヘッダーから取り出した次ページのパス
///
/// 1回のリクエストにだけ使える。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationCursor(String);

impl PaginationCursor {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// `header` を含むページの次のページのカーソル
    ///
    /// パスは最初の `<` と最後の `>` の間をそのまま使う。
    /// 空のヘッダーは次ページなしを表す。
    ///
    /// # Examples
    /// - `</v2/_catalog?last=b&n=2>; rel="next"` -> `/v2/_catalog?last=b&n=2`
    pub fn from_link_header(header: &str) -> Result<Option<Self>> {
        if header.trim().is_empty() {
            return Ok(None);
        }
        match (header.find('<'), header.rfind('>')) {
            (Some(start), Some(end)) if start < end => {
                Ok(Some(Self(header[start + 1..end].to_string())))
            }
            _ => Err(RegistryError::MalformedLink(header.to_string())),
        }
    }

    pub fn path(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_path_between_brackets() {
        let cursor = PaginationCursor::from_link_header(r#"</v2/_catalog?last=b&n=2>; rel="next""#)
            .unwrap()
            .unwrap();
        assert_eq!(cursor.path(), "/v2/_catalog?last=b&n=2");
    }

    #[test]
    fn test_first_open_and_last_close() {
        let cursor = PaginationCursor::from_link_header("<</v2/x<y>>; rel=next")
            .unwrap()
            .unwrap();
        assert_eq!(cursor.path(), "</v2/x<y>");
    }

    #[test]
    fn test_empty_header_ends_pagination() {
        assert_eq!(PaginationCursor::from_link_header("").unwrap(), None);
        assert_eq!(PaginationCursor::from_link_header("   ").unwrap(), None);
    }

    #[test]
    fn test_malformed_header() {
        for header in ["rel=next", "/v2/_catalog>; <", "<no-close"] {
            assert!(matches!(
                PaginationCursor::from_link_header(header),
                Err(RegistryError::MalformedLink(_))
            ));
        }
    }
}
