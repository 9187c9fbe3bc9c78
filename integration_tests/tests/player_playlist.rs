//! Wires a stub player into the player registry and a playlist the way a
//! real module would, then exercises registration, playback arbitration,
//! navigation, and seeded shuffle reproducibility across the public API.

use std::sync::{Arc, Mutex};

use melo::players::descriptor::{PlayState, PlayerDescriptor};
use melo::players::registry::{Player, PlayerRegistry};
use melo::playlist::Playlist;

#[derive(Default)]
struct StubPlayer {
    played: Mutex<Vec<String>>,
    position_ms: Mutex<u64>,
}

impl Player for StubPlayer {
    fn play(&self, path: &str) {
        self.played.lock().unwrap().push(path.to_string());
    }
    fn set_state(&self, _state: PlayState) {}
    fn set_position(&self, position_ms: u64) {
        *self.position_ms.lock().unwrap() = position_ms;
    }
    fn get_position(&self) -> u64 {
        *self.position_ms.lock().unwrap()
    }
    fn set_volume(&self, _volume: f32, _muted: bool) {}
}

fn descriptor(id: &str) -> PlayerDescriptor {
    PlayerDescriptor {
        id: id.to_string(),
        display_name: id.to_string(),
        description: String::new(),
        icon: String::new(),
    }
}

#[test]
fn registering_a_player_makes_it_addressable_but_not_current() {
    let registry = PlayerRegistry::new();
    let stub = Arc::new(StubPlayer::default());
    registry.register(descriptor("kitchen"), stub).expect("first registration");

    assert_eq!(registry.current_id(), None);
    assert!(registry.register(descriptor("kitchen"), Arc::new(StubPlayer::default())).is_err());
}

#[test]
fn playing_a_playlist_entry_drives_the_registered_player() {
    let players = Arc::new(PlayerRegistry::new());
    let stub = Arc::new(StubPlayer::default());
    players.register(descriptor("kitchen"), stub.clone()).expect("registration");

    let playlist = Playlist::new("default", players.clone());
    playlist.add_media("kitchen", "/music/a.mp3", "Track A", None);
    playlist.add_media("kitchen", "/music/b.mp3", "Track B", None);

    playlist.play(&[0]).expect("playable entry");
    assert_eq!(players.current_id(), Some("kitchen".to_string()));
    assert_eq!(stub.played.lock().unwrap().as_slice(), ["/music/a.mp3"]);

    assert!(playlist.play_next());
    assert_eq!(stub.played.lock().unwrap().as_slice(), ["/music/a.mp3", "/music/b.mp3"]);
    assert!(!playlist.play_next());
}

#[test]
fn shuffle_with_the_same_seed_reproduces_the_same_order() {
    let players = Arc::new(PlayerRegistry::new());
    players.register(descriptor("kitchen"), Arc::new(StubPlayer::default())).expect("registration");

    let order_for_seed = |seed: u64| {
        let playlist = Playlist::new("default", players.clone());
        for (i, name) in ["A", "B", "C", "D", "E"].iter().enumerate() {
            playlist.add_media("kitchen", &format!("/music/{i}.mp3"), name, None);
        }
        assert!(playlist.set_shuffle_seeded(true, seed));
        playlist.get_media_list(0, 5).iter().map(|m| m.name.clone()).collect::<Vec<_>>()
    };

    let first = order_for_seed(7);
    let second = order_for_seed(7);
    assert_eq!(first, second);

    let mut sorted_first = first.clone();
    sorted_first.sort();
    assert_eq!(sorted_first, vec!["A", "B", "C", "D", "E"]);
}

#[test]
fn disabling_shuffle_restores_the_original_order() {
    let players = Arc::new(PlayerRegistry::new());
    players.register(descriptor("kitchen"), Arc::new(StubPlayer::default())).expect("registration");

    let playlist = Playlist::new("default", players);
    for (i, name) in ["A", "B", "C"].iter().enumerate() {
        playlist.add_media("kitchen", &format!("/music/{i}.mp3"), name, None);
    }
    let original: Vec<String> = playlist.get_media_list(0, 3).iter().map(|m| m.name.clone()).collect();

    assert!(playlist.set_shuffle_seeded(true, 99));
    assert!(playlist.is_shuffled());
    assert!(playlist.set_shuffle_seeded(false, 0));
    assert!(!playlist.is_shuffled());

    let restored: Vec<String> = playlist.get_media_list(0, 3).iter().map(|m| m.name.clone()).collect();
    assert_eq!(restored, original);
}
