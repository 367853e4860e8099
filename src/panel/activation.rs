use crate::error::{SyncError, SyncResult};
use crate::store::BoardId;

/// Board of the active page, if the page is a board of the host application
pub fn board_for_page(page_url: &str, board_url_prefix: &str) -> SyncResult<BoardId> {
    let rest = page_url
        .strip_prefix(board_url_prefix)
        .ok_or_else(|| SyncError::InvalidBoardUrl(page_url.to_string()))?;
    BoardId::from_url(rest).ok_or_else(|| SyncError::InvalidBoardUrl(page_url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_BOARD_URL_PREFIX;

    #[test]
    fn test_board_page_activates() {
        let board = board_for_page(
            "https://app.conceptboard.com/board/w1x2-y3z4-a5b6-c7d8-e9f0",
            DEFAULT_BOARD_URL_PREFIX,
        )
        .unwrap();
        assert_eq!(board.as_str(), "w1x2-y3z4-a5b6-c7d8-e9f0");
    }

    #[test]
    fn test_other_site_is_rejected() {
        assert!(matches!(
            board_for_page(
                "https://example.com/board/w1x2-y3z4-a5b6-c7d8-e9f0",
                DEFAULT_BOARD_URL_PREFIX
            ),
            Err(SyncError::InvalidBoardUrl(_))
        ));
    }

    #[test]
    fn test_board_listing_is_rejected() {
        for url in [
            "https://app.conceptboard.com/board/",
            "https://app.conceptboard.com/boards",
        ] {
            assert!(board_for_page(url, DEFAULT_BOARD_URL_PREFIX).is_err());
        }
    }
}
