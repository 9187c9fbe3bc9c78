//! Request dispatch: `Playlist.Request` handling per §4.5's closing
//! paragraph. Each request takes a [`Request`] handle; `GetMediaList`'s
//! response may span multiple messages, so every arm completes the handle
//! itself rather than returning a single value to a caller.

use crate::message::MessagePayload;
use crate::request::Request;

use super::{MediaRange, Playlist, PlaylistRequest, PlaylistResponse};

/// Maximum entries delivered per `MediaList` message before paging to a
/// second message; keeps a single broadcast from growing unbounded on a
/// large playlist.
const MEDIA_LIST_PAGE: usize = 256;

/// Dispatch `request` against `playlist`, delivering one or more
/// `Playlist.Response` messages through `handle` and completing it.
pub fn dispatch(playlist: &Playlist, request: &PlaylistRequest, handle: &Request) {
    playlist.requests().track(handle.clone());

    match request {
        PlaylistRequest::GetMediaList { offset, count } => {
            get_media_list(playlist, *offset, *count, handle);
        }
        PlaylistRequest::GetCurrent => {
            let indices = playlist.current_indices();
            handle.send_response(PlaylistResponse::Current { indices }.pack());
        }
        PlaylistRequest::Play { indices } => {
            let response = match playlist.play(indices) {
                Ok(()) => PlaylistResponse::Ok,
                Err(err) => PlaylistResponse::Error { text: err.to_string() },
            };
            handle.send_response(response.pack());
        }
        PlaylistRequest::Move { range, dest } => {
            playlist.move_range(&range.first_indices, range.length, dest);
            handle.send_response(PlaylistResponse::Ok.pack());
        }
        PlaylistRequest::Delete { range } => {
            playlist.delete(&range.first_indices, range.length);
            handle.send_response(PlaylistResponse::Ok.pack());
        }
        PlaylistRequest::Shuffle(enable) => {
            playlist.set_shuffle(*enable);
            handle.send_response(PlaylistResponse::Ok.pack());
        }
    }

    handle.complete();
}

fn get_media_list(playlist: &Playlist, offset: usize, count: usize, handle: &Request) {
    let mut remaining = count;
    let mut cursor = offset;
    loop {
        let page = remaining.min(MEDIA_LIST_PAGE);
        let items = playlist.get_media_list(cursor, page);
        let delivered = items.len();
        handle.send_response(
            PlaylistResponse::MediaList { items, offset: cursor, count: delivered }.pack(),
        );
        if delivered < page || delivered == 0 {
            break;
        }
        cursor += delivered;
        remaining = remaining.saturating_sub(delivered);
        if remaining == 0 {
            break;
        }
    }
}

/// Validate a [`MediaRange`] against a playlist's current top-level length,
/// used by callers that need to reject an out-of-bounds request before
/// invoking [`dispatch`] (dispatch itself degrades silently on a bad path,
/// matching the underlying list primitives' no-op-on-miss behavior).
#[must_use]
pub fn range_in_bounds(playlist: &Playlist, range: &MediaRange) -> bool {
    let Some(&first) = range.first_indices.first() else { return false };
    first + range.length <= playlist.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::players::descriptor::PlayerDescriptor;
    use crate::players::registry::{Player, PlayerRegistry};
    use crate::players::tags::Tags;
    use crate::request::RequestCallback;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    struct StubPlayer {
        position: AtomicU64,
    }

    impl Player for StubPlayer {
        fn play(&self, _path: &str) {}
        fn set_state(&self, _state: crate::players::descriptor::PlayState) {}
        fn set_position(&self, position_ms: u64) {
            self.position.store(position_ms, Ordering::SeqCst);
        }
        fn get_position(&self) -> u64 {
            self.position.load(Ordering::SeqCst)
        }
        fn set_volume(&self, _volume: f32, _muted: bool) {}
    }

    fn playlist_with_two_entries() -> Playlist {
        let registry = Arc::new(PlayerRegistry::new());
        registry
            .register(
                PlayerDescriptor {
                    id: "p".to_string(),
                    display_name: "p".to_string(),
                    description: String::new(),
                    icon: String::new(),
                },
                Arc::new(StubPlayer { position: AtomicU64::new(0) }),
            )
            .unwrap();
        let playlist = Playlist::new("default", registry);
        playlist.add_media("p", "/a", "A", Some(Tags::default()));
        playlist.add_media("p", "/b", "B", Some(Tags::default()));
        playlist
    }

    fn capturing_handle() -> (Request, Arc<Mutex<Vec<PlaylistResponse>>>) {
        let captured: Arc<Mutex<Vec<PlaylistResponse>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = captured.clone();
        let callback: RequestCallback = Box::new(move |msg| {
            if !msg.is_null() {
                if let Ok(response) = PlaylistResponse::unpack(msg) {
                    sink.lock().unwrap().push(response);
                }
            }
            true
        });
        (Request::new("playlist:default", callback), captured)
    }

    #[test]
    fn get_media_list_delivers_both_entries() {
        let playlist = playlist_with_two_entries();
        let (handle, captured) = capturing_handle();

        dispatch(&playlist, &PlaylistRequest::GetMediaList { offset: 0, count: 10 }, &handle);

        let responses = captured.lock().unwrap();
        assert_eq!(responses.len(), 1);
        assert!(matches!(&responses[0], PlaylistResponse::MediaList { items, .. } if items.len() == 2));
    }

    #[test]
    fn play_request_reports_ok_and_updates_current() {
        let playlist = playlist_with_two_entries();
        let (handle, captured) = capturing_handle();

        dispatch(&playlist, &PlaylistRequest::Play { indices: vec![0] }, &handle);

        assert_eq!(playlist.current_indices(), Some(vec![0]));
        let responses = captured.lock().unwrap();
        assert!(matches!(responses.last(), Some(PlaylistResponse::Ok)));
    }

    #[test]
    fn range_in_bounds_rejects_overrun() {
        let playlist = playlist_with_two_entries();
        let range = MediaRange { first_indices: vec![1], length: 5 };
        assert!(!range_in_bounds(&playlist, &range));
    }
}
