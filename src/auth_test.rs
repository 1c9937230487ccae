use super::*;

#[test]
fn user_from_full_email() {
    let u = User::from_email("ada@lovelace.dev");
    assert_eq!(u.email, "ada@lovelace.dev");
    assert_eq!(u.name, "ada");
    assert_eq!(u.avatar.as_deref(), Some("https://picsum.photos/seed/ada@lovelace.dev/200"));
}

#[test]
fn blank_email_falls_back() {
    let u = User::from_email("");
    assert_eq!(u.email, FALLBACK_EMAIL);
    assert_eq!(u.name, FALLBACK_NAME);
    assert_eq!(u.avatar.as_deref(), Some("https://picsum.photos/seed//200"));
}

#[test]
fn name_is_text_before_first_at() {
    assert_eq!(User::from_email("no-at-sign").name, "no-at-sign");
    assert_eq!(User::from_email("@host").name, FALLBACK_NAME);
    assert_eq!(User::from_email("a@b@c").name, "a");
}

#[test]
fn pending_login_resolves_after_delay() {
    let t0 = Instant::now();
    let pending = PendingLogin::start("kim@x.io", t0);
    assert!(pending.poll(t0).is_none());
    assert!(pending.poll(t0 + Duration::from_millis(1199)).is_none());
    assert_eq!(pending.remaining(t0 + Duration::from_millis(200)), Duration::from_millis(1000));
    let user = pending.poll(t0 + MOCK_LOGIN_DELAY).unwrap();
    assert_eq!(user.name, "kim");
}
