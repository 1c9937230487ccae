use super::*;

#[test]
fn parse_empty_gives_defaults() {
    assert_eq!(AppSettings::parse(""), AppSettings::default());
}

#[test]
fn parse_reads_known_keys() {
    let cfg = "theme_mode=dark\n\
               brush_size=42\n\
               ai_provider=local\n\
               ai_base_url=http://localhost:8080/v1/\n\
               ai_model=test-model\n\
               ai_api_key_env=MY_KEY\n\
               ai_timeout_secs=15\n";
    let s = AppSettings::parse(cfg);
    assert_eq!(s.theme, ThemePreference::Dark);
    assert_eq!(s.brush_size, 42);
    assert_eq!(s.ai_provider, AiProvider::Local);
    assert_eq!(s.ai_base_url, "http://localhost:8080/v1");
    assert_eq!(s.ai_model, "test-model");
    assert_eq!(s.ai_api_key_env, "MY_KEY");
    assert_eq!(s.ai_timeout_secs, 15);
}

#[test]
fn malformed_values_keep_defaults() {
    let s = AppSettings::parse("theme_mode=purple\nbrush_size=lots\nai_timeout_secs=0\nnot a line\nfoo=bar\n");
    assert_eq!(s, AppSettings::default());
}

#[test]
fn brush_size_is_clamped() {
    assert_eq!(AppSettings::parse("brush_size=1").brush_size, 5);
    assert_eq!(AppSettings::parse("brush_size=900").brush_size, 100);
}

#[test]
fn save_then_load_preserves_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("lumina_settings.cfg");
    let settings = AppSettings {
        theme: ThemePreference::Light,
        brush_size: 60,
        ai_provider: AiProvider::Local,
        ..AppSettings::default()
    };
    settings.save_to(&path).unwrap();
    assert_eq!(AppSettings::load_from(&path), settings);
}

#[test]
fn unknown_legacy_keys_are_ignored() {
    assert_eq!(AppSettings::parse("confirm_reset=false\n"), AppSettings::default());
}

#[test]
fn toggled_theme_and_brush_size_persist() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lumina_settings.cfg");
    let mut settings = AppSettings::default();

    assert!(settings.remember_theme(ThemeMode::Dark));
    assert!(!settings.remember_theme(ThemeMode::Dark));
    assert!(settings.remember_brush_size(64));
    assert!(!settings.remember_brush_size(64));
    assert!(settings.remember_brush_size(500));
    settings.save_to(&path).unwrap();

    let reloaded = AppSettings::load_from(&path);
    assert_eq!(reloaded.theme, ThemePreference::Dark);
    assert_eq!(reloaded.theme.resolve(Some(false)), ThemeMode::Dark);
    assert_eq!(reloaded.brush_size, 100);
}

#[test]
fn missing_file_loads_defaults() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(AppSettings::load_from(&dir.path().join("absent.cfg")), AppSettings::default());
}
