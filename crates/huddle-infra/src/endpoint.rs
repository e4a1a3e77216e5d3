//! URL helpers shared by the HTTP and WebSocket adapters.

use reqwest::Url;

/// Append path segments to `base`, percent-encoding each one.
///
/// A trailing slash on the base is ignored, so `https://h/chat` and
/// `https://h/chat/` produce the same result. Returns `None` for bases
/// that cannot carry a path (e.g. `mailto:`).
pub fn with_segments(base: &Url, segments: &[&str]) -> Option<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(segments);
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_to_base_path() {
        let base = Url::parse("https://api.example.com/chat").unwrap();
        let url = with_segments(&base, &["rooms", "42", "messages"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/chat/rooms/42/messages");
    }

    #[test]
    fn trailing_slash_on_base_is_ignored() {
        let base = Url::parse("wss://live.example.com/ws/").unwrap();
        let url = with_segments(&base, &["r1", "ana"]).unwrap();
        assert_eq!(url.as_str(), "wss://live.example.com/ws/r1/ana");
    }

    #[test]
    fn segments_are_percent_encoded() {
        let base = Url::parse("wss://live.example.com/ws").unwrap();
        let url = with_segments(&base, &["room/1", "Ana María"]).unwrap();
        assert_eq!(
            url.as_str(),
            "wss://live.example.com/ws/room%2F1/Ana%20Mar%C3%ADa"
        );
    }

    #[test]
    fn cannot_be_a_base_is_rejected() {
        let base = Url::parse("mailto:someone@example.com").unwrap();
        assert!(with_segments(&base, &["x"]).is_none());
    }
}
