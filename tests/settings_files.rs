use tradepost::infra_memory::Seed;
use tradepost::settings::parse_settings;

#[test]
fn shipped_settings_files_parse() {
    let dev = parse_settings(Some("settings/dev.toml")).unwrap();
    assert_eq!(dev.storage.backend, "memory");
    assert_eq!(dev.auth.backend, "fake");
    assert!(dev.http.tls.is_none());

    let release = parse_settings(Some("settings/release.toml")).unwrap();
    assert_eq!(release.storage.backend, "mysql");
    assert_eq!(release.realtime.backend, "kafka");
    assert!(release.http.tls.is_some());
    assert_eq!(release.contact.cooldown_hours, 24);
}

#[tokio::test]
async fn shipped_seed_loads() {
    let seed = Seed::load(std::path::Path::new("settings/seed.json"))
        .await
        .unwrap();
    assert_eq!(seed.users.len(), 3);
    assert!(seed.posts.iter().all(|p| seed.users.iter().any(|u| u.user_id == p.owner)));
}
