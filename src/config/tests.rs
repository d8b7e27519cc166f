use super::load::config_path;
use super::schema::*;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// Tests touching process-wide environment variables take this lock.
static ENV: Mutex<()> = Mutex::new(());

/// Run `f` with the given variables set (`Some`) or unset (`None`), restoring
/// their previous values afterwards.
fn with_env<T>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> T) -> T {
    let _lock = ENV.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<_> = vars
        .iter()
        .map(|(key, _)| (key.to_string(), std::env::var_os(key)))
        .collect();
    for (key, value) in vars {
        // SAFETY: serialized by ENV; no other test thread reads these keys
        // without holding it.
        unsafe {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
    let out = f();
    for (key, old) in saved {
        unsafe {
            match old {
                Some(v) => std::env::set_var(&key, v),
                None => std::env::remove_var(&key),
            }
        }
    }
    out
}

fn write_config(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("config.toml");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn config_path_precedence() {
    let explicit = with_env(
        &[
            ("PLAYSTREAM_CONFIG_PATH", Some("/srv/radio/playstream.toml")),
            ("XDG_CONFIG_HOME", Some("/xdg")),
        ],
        config_path,
    );
    assert_eq!(explicit, Some(PathBuf::from("/srv/radio/playstream.toml")));

    let xdg = with_env(
        &[
            ("PLAYSTREAM_CONFIG_PATH", None),
            ("XDG_CONFIG_HOME", Some("/xdg")),
            ("HOME", Some("/home/dj")),
        ],
        config_path,
    );
    assert_eq!(xdg, Some(PathBuf::from("/xdg/playstream/config.toml")));

    let home = with_env(
        &[
            ("PLAYSTREAM_CONFIG_PATH", None),
            ("XDG_CONFIG_HOME", None),
            ("HOME", Some("/home/dj")),
        ],
        config_path,
    );
    assert_eq!(
        home,
        Some(PathBuf::from("/home/dj/.config/playstream/config.toml"))
    );
}

#[test]
fn file_configures_session_playlist_and_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"
[session]
auto_play = true

[playlist]
initial_track = 2
auto_play_next = true

[engine]
tick_ms = 100
initial_volume = 0.5
"#,
    );

    let s = with_env(&[("PLAYSTREAM__ENGINE__TICK_MS", None)], || {
        Settings::load_from(Some(&path)).unwrap()
    });
    assert_eq!(s.session, SessionConfig { auto_play: true });
    assert_eq!(
        s.playlist,
        PlaylistConfig {
            auto_play: false,
            initial_track: 2,
            auto_play_next: true,
        }
    );
    assert_eq!(s.engine.tick_ms, 100);
    assert_eq!(s.engine.initial_volume, 0.5);
    assert!(s.validate().is_ok());
}

#[test]
fn environment_overrides_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[playlist]\nauto_play_next = false\n");

    let s = with_env(
        &[
            ("PLAYSTREAM__PLAYLIST__AUTO_PLAY_NEXT", Some("true")),
            ("PLAYSTREAM__ENGINE__TICK_MS", Some("40")),
        ],
        || Settings::load_from(Some(&path)).unwrap(),
    );
    assert!(s.playlist.auto_play_next);
    assert_eq!(s.engine.tick_ms, 40);
}

#[test]
fn load_reads_the_explicit_config_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[session]\nauto_play = true\n");

    let s = with_env(
        &[("PLAYSTREAM_CONFIG_PATH", Some(path.to_str().unwrap()))],
        || Settings::load().unwrap(),
    );
    assert!(s.session.auto_play);
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let absent = dir.path().join("absent.toml");

    let s = with_env(&[("PLAYSTREAM__ENGINE__TICK_MS", None)], || {
        Settings::load_from(Some(&absent)).unwrap()
    });
    assert_eq!(s.session, SessionConfig::default());
    assert_eq!(s.playlist, PlaylistConfig::default());
    assert_eq!(s.engine.tick_ms, 250);
}

#[test]
fn invalid_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[engine]\ninitial_volume = 3.0\n");

    let s = with_env(
        &[
            ("PLAYSTREAM_CONFIG_PATH", Some(path.to_str().unwrap())),
            ("PLAYSTREAM__ENGINE__TICK_MS", None),
        ],
        Settings::load_or_default,
    );
    assert_eq!(s.engine.initial_volume, 1.0);
}

#[test]
fn inline_toml_fills_missing_sections_with_defaults() {
    let s = Settings::from_toml_str(
        r#"
[playlist]
auto_play_next = true
"#,
    )
    .unwrap();
    assert!(s.playlist.auto_play_next);
    assert_eq!(s.playlist.initial_track, 0);
    assert!(!s.session.auto_play);
    assert_eq!(s.engine.initial_volume, 1.0);
}

#[test]
fn inline_toml_rejects_wrong_types() {
    assert!(Settings::from_toml_str("[engine]\ntick_ms = \"fast\"\n").is_err());
}

#[test]
fn validate_rejects_zero_tick_and_out_of_range_volume() {
    let mut s = Settings::default();
    s.engine.tick_ms = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.engine.initial_volume = 1.5;
    assert!(s.validate().is_err());
}

#[test]
fn playlist_config_projects_session_config() {
    let cfg = PlaylistConfig {
        auto_play: true,
        initial_track: 1,
        auto_play_next: false,
    };
    assert_eq!(cfg.session(), SessionConfig { auto_play: true });
}
