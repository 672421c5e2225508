use std::io::Write;

use rmqt_config::*;

#[test]
fn later_profile_overrides_earlier_one() {
    let base = r#"
host: http://rabbit.internal
port: 15672
vhost: prod
username: ops
"#;
    let local = r#"
vhost: staging
"#;
    let layer = load_layered_yaml_from_strings(&[base, local]).expect("profiles must load");
    assert_eq!(layer.host.as_deref(), Some("http://rabbit.internal"));
    assert_eq!(layer.port, Some(15672));
    assert_eq!(layer.vhost.as_deref(), Some("staging"));
    assert_eq!(layer.username.as_deref(), Some("ops"));
    assert_eq!(layer.password, None);
}

#[test]
fn unknown_keys_are_rejected_by_name() {
    let yaml = r#"
host: http://rabbit.internal
hots: typo
tls:
  verify: false
"#;
    let err = load_layered_yaml_from_strings(&[yaml]).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("CONFIG_UNKNOWN_KEYS"), "{msg}");
    assert!(msg.contains("\"hots\""), "{msg}");
    assert!(msg.contains("\"tls\""), "{msg}");
    assert!(!msg.contains("\"host\""), "{msg}");
}

#[test]
fn wrong_value_type_is_an_error() {
    let err = load_layered_yaml_from_strings(&["port: not-a-number"]).unwrap_err();
    assert!(format!("{err:#}").contains("invalid profile values"), "{err:#}");
}

#[test]
fn empty_profile_sets_nothing() {
    let layer = load_layered_yaml_from_strings(&["", "# only a comment\n"]).unwrap();
    assert!(layer.is_empty());
}

#[test]
fn literal_password_is_accepted() {
    let layer = load_layered_yaml_from_strings(&["password: letmein"]).unwrap();
    assert_eq!(layer.password.as_deref(), Some("letmein"));
}

#[test]
fn profiles_load_from_files_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("base.yaml");
    let second = dir.path().join("override.yaml");
    std::fs::File::create(&first)
        .unwrap()
        .write_all(b"host: http://one\nport: 1000\n")
        .unwrap();
    std::fs::File::create(&second)
        .unwrap()
        .write_all(b"port: 2000\n")
        .unwrap();

    let layer = load_layered_yaml(&[&first, &second]).unwrap();
    assert_eq!(layer.host.as_deref(), Some("http://one"));
    assert_eq!(layer.port, Some(2000));
}

#[test]
fn missing_profile_file_names_the_path() {
    let err = load_layered_yaml(&["/definitely/not/here.yaml"]).unwrap_err();
    assert!(err.to_string().contains("/definitely/not/here.yaml"), "{err}");
}

#[test]
fn cli_beats_env_beats_profile_beats_defaults() {
    let profile = load_layered_yaml_from_strings(&["host: http://profile\nvhost: p\nusername: p-user"]).unwrap();
    let env = from_env_lookup(|name| match name {
        ENV_VHOST => Some("e".to_string()),
        ENV_USERNAME => Some("e-user".to_string()),
        _ => None,
    })
    .unwrap();
    let cli = PartialSettings {
        username: Some("cli-user".to_string()),
        ..Default::default()
    };

    let s = resolve(&profile, &env, &cli);
    assert_eq!(s.host, "http://profile");
    assert_eq!(s.port, DEFAULT_PORT);
    assert_eq!(s.vhost, "e");
    assert_eq!(s.username, "cli-user");
    assert_eq!(s.password, DEFAULT_PASSWORD);
}
