//! `Browser.Request`/`Browser.Response` wire glue. The concrete browsers
//! (radio/file/library) are external collaborators; this module only
//! defines the wire contract and dispatches it to whichever [`BrowserSource`]
//! a module registers, the same "trait at the seam" shape used for
//! [`crate::players::registry::Player`].

use serde::{Deserialize, Serialize};

use crate::message::MessagePayload;
use crate::players::tags::Tags;
use crate::request::Request;

/// What a `DoAction` request asks the source to do with an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Play,
    Add,
    SetFavorite,
    UnsetFavorite,
}

/// Whether a listed item is itself a container or a playable leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Folder,
    Media,
}

/// One entry in a `Browser.Response.MediaList`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserItem {
    pub id: String,
    pub name: String,
    pub kind: ItemKind,
    pub favorite: bool,
    pub tags: Tags,
    pub action_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BrowserRequest {
    GetMediaList { query: String, offset: usize, count: usize, sort: Vec<String> },
    DoAction { path: String, kind: ActionKind },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BrowserResponse {
    MediaList {
        items: Vec<BrowserItem>,
        actions: Vec<String>,
        sort_menus: Vec<String>,
        count: usize,
        offset: usize,
    },
    Ok,
    Error {
        text: String,
    },
}

/// Implemented by a concrete module-specific browser (radio/file/library).
/// `get_media_list` and `do_action` are synchronous because a single
/// backing source is expected to answer from an in-memory index or a
/// local database; sources that need to do real I/O should pre-fetch on
/// their own schedule rather than block the RTSP/event loop thread here.
pub trait BrowserSource: Send + Sync {
    fn get_media_list(&self, query: &str, offset: usize, count: usize, sort: &[String]) -> BrowserResponse;
    fn do_action(&self, path: &str, kind: ActionKind) -> BrowserResponse;
}

/// Dispatch `request` against `source`, delivering one `Browser.Response`
/// message through `handle` and completing it.
pub fn dispatch(source: &dyn BrowserSource, request: &BrowserRequest, handle: &Request) {
    let response = match request {
        BrowserRequest::GetMediaList { query, offset, count, sort } => {
            source.get_media_list(query, *offset, *count, sort)
        }
        BrowserRequest::DoAction { path, kind } => source.do_action(path, *kind),
    };
    handle.send_response(response.pack());
    handle.complete();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestCallback;
    use std::sync::{Arc, Mutex};

    struct StubSource;

    impl BrowserSource for StubSource {
        fn get_media_list(&self, _query: &str, offset: usize, _count: usize, _sort: &[String]) -> BrowserResponse {
            BrowserResponse::MediaList {
                items: vec![BrowserItem {
                    id: "1".to_string(),
                    name: "Track".to_string(),
                    kind: ItemKind::Media,
                    favorite: false,
                    tags: Tags::default(),
                    action_ids: vec!["play".to_string()],
                }],
                actions: vec!["play".to_string()],
                sort_menus: vec![],
                count: 1,
                offset,
            }
        }

        fn do_action(&self, _path: &str, _kind: ActionKind) -> BrowserResponse {
            BrowserResponse::Ok
        }
    }

    fn capturing_handle() -> (Request, Arc<Mutex<Vec<BrowserResponse>>>) {
        let captured: Arc<Mutex<Vec<BrowserResponse>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = captured.clone();
        let callback: RequestCallback = Box::new(move |msg| {
            if !msg.is_null() {
                if let Ok(response) = BrowserResponse::unpack(msg) {
                    sink.lock().unwrap().push(response);
                }
            }
            true
        });
        (Request::new("browser:library", callback), captured)
    }

    #[test]
    fn get_media_list_round_trips_through_source() {
        let source = StubSource;
        let (handle, captured) = capturing_handle();

        dispatch(
            &source,
            &BrowserRequest::GetMediaList { query: String::new(), offset: 0, count: 10, sort: vec![] },
            &handle,
        );

        let responses = captured.lock().unwrap();
        assert!(matches!(&responses[0], BrowserResponse::MediaList { items, .. } if items.len() == 1));
    }

    #[test]
    fn do_action_reports_ok() {
        let source = StubSource;
        let (handle, captured) = capturing_handle();

        dispatch(&source, &BrowserRequest::DoAction { path: "/1".to_string(), kind: ActionKind::Play }, &handle);

        assert!(matches!(captured.lock().unwrap().last(), Some(BrowserResponse::Ok)));
    }
}
