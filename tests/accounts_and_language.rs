//! Sign-up, quiz rewards and language changes against a real SQLite store.

use uuid::Uuid;

use fasal_rakshak::prelude::*;

async fn store() -> SqliteStore {
    SqliteStore::connect("sqlite::memory:").await.unwrap()
}

#[tokio::test]
async fn test_signup_creates_profile_and_session() {
    let store = store().await;
    let identity = store.identity();
    let mut sessions = identity.subscribe();

    let session = register(&identity, &store, "sunita@example.in", "monsoon1", "Sunita Jadhav", Language::Mr)
        .await
        .unwrap();

    let profile = store.get_profile(session.user_id).await.unwrap().unwrap();
    assert_eq!(profile.full_name, "Sunita Jadhav");
    assert_eq!(profile.preferred_language, Language::Mr);
    assert_eq!(profile.coins_earned, 0);

    sessions.changed().await.unwrap();
    assert_eq!(sessions.borrow_and_update().as_ref().map(|s| s.user_id), Some(session.user_id));

    identity.sign_out().await.unwrap();
    sessions.changed().await.unwrap();
    assert!(sessions.borrow().is_none());

    let wrong = identity.sign_in("sunita@example.in", "drought9").await;
    assert!(matches!(wrong, Err(FasalError::AuthError(_))));
}

#[tokio::test]
async fn test_quiz_rewards_once_per_question() {
    let store = store().await;
    let identity = store.identity();
    let session = register(&identity, &store, "ravi@example.in", "monsoon1", "Ravi", Language::Hi)
        .await
        .unwrap();
    let owner = session.user_id;

    let mut quiz = QuizEngine::load(&store, owner).await;
    let first = quiz.current();
    let outcome = quiz.submit_answer(&store, first.correct).await.unwrap();
    assert_eq!(outcome.coins_awarded, first.coins);

    // A fresh session re-answers the same question: no second reward.
    let mut again = QuizEngine::with_progress(owner, Default::default(), 0);
    assert_eq!(again.current().id, first.id);
    let repeat = again.submit_answer(&store, first.correct).await.unwrap();
    assert_eq!(repeat.coins_awarded, 0);

    let profile = store.get_profile(owner).await.unwrap().unwrap();
    assert_eq!(profile.coins_earned, u64::from(first.coins));

    let reloaded = QuizEngine::load(&store, owner).await;
    assert_ne!(reloaded.current().id, first.id);
}

#[tokio::test]
async fn test_language_change_follows_profile() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.toml");
    let store = store().await;
    let identity = store.identity();
    let session = register(&identity, &store, "meena@example.in", "monsoon1", "Meena", Language::Hi)
        .await
        .unwrap();

    let mut prefs = LanguagePreferences::load(&path);
    prefs.set(Language::Hi).unwrap();
    prefs.change_for_profile(&store, session.user_id, Language::Mr).await.unwrap();
    assert_eq!(LanguagePreferences::load(&path).language(), Language::Mr);
    assert_eq!(
        store.get_profile(session.user_id).await.unwrap().unwrap().preferred_language,
        Language::Mr
    );

    // No profile for this owner: the change is refused and the file kept.
    let err = prefs.change_for_profile(&store, Uuid::new_v4(), Language::En).await;
    assert!(err.is_err());
    assert_eq!(prefs.language(), Language::Mr);
    assert_eq!(LanguagePreferences::load(&path).language(), Language::Mr);
    assert_eq!(prefs.t("crop"), "पीक");
}

#[test]
fn test_errors_render_in_each_language() {
    let translator = Translator::new();
    let offline = FasalError::NetworkError("connection refused".into());
    for language in [Language::Hi, Language::Mr, Language::En] {
        let text = translator.error_message(language, &offline);
        assert!(!text.starts_with("MISSING:"), "{language}");
    }
}
