//! Service-level behaviour over the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use quill_core::DomainError;
use quill_core::domain::{Actor, PageRequest, RelationKind, ToggleState, User};
use quill_core::ports::ArticleFilter;
use quill_core::services::{
    ArticleChanges, CommentChanges, ContentService, CredentialChanges, Feed, FeedService,
    IdentityService, NewArticle, NewComment, ProfileChanges, RelationService, Repositories,
    SignUp,
};

use crate::auth::Argon2PasswordService;
use crate::memory::InMemoryStore;

const PASSWORD: &str = "asdf1234!!";

struct Harness {
    repos: Repositories,
    identity: IdentityService,
    content: Arc<ContentService>,
    relations: Arc<RelationService>,
    feed: FeedService,
}

fn harness() -> Harness {
    let repos = InMemoryStore::new().repositories();
    let content = Arc::new(ContentService::new(&repos));
    Harness {
        identity: IdentityService::new(&repos, Arc::new(Argon2PasswordService::fast())),
        relations: Arc::new(RelationService::new(&repos)),
        feed: FeedService::new(&repos, content.clone()),
        content,
        repos,
    }
}

fn signup(username: &str) -> SignUp {
    SignUp {
        username: username.to_string(),
        email: format!("{username}@naver.com"),
        password: PASSWORD.to_string(),
        password_confirmation: PASSWORD.to_string(),
    }
}

impl Harness {
    async fn user(&self, username: &str) -> (User, Actor) {
        let user = self.identity.create_identity(signup(username)).await.unwrap();
        let actor = Actor::from(&user);
        (user, actor)
    }

    async fn article(&self, actor: &Actor, title: &str) -> uuid::Uuid {
        let article = self
            .content
            .create_article(
                Some(actor),
                NewArticle {
                    title: title.to_string(),
                    content: "본문".to_string(),
                },
            )
            .await
            .unwrap();
        // Keep created_at strictly increasing between fixtures.
        tokio::time::sleep(Duration::from_millis(2)).await;
        article.id
    }
}

fn validation_fields(err: DomainError) -> Vec<String> {
    match err {
        DomainError::Validation(errors) => errors.fields().keys().cloned().collect(),
        other => panic!("expected validation error, got {other:?}"),
    }
}

// ── identity ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_signup_creates_identity_and_empty_profile() {
    let h = harness();
    let (user, _) = h.user("zxcvbnasdf_").await;

    assert!(user.is_active);
    assert!(!user.is_admin);
    assert_ne!(user.password_hash, PASSWORD);

    let view = h.identity.get_profile(user.id).await.unwrap();
    assert_eq!(view.username, "zxcvbnasdf_");
    assert_eq!(view.bio, None);
    assert!(view.articles.is_empty());
}

#[tokio::test]
async fn test_signup_rejects_taken_username_and_email() {
    let h = harness();
    h.user("zxcvbnasdf_").await;

    let err = h
        .identity
        .create_identity(signup("zxcvbnasdf_"))
        .await
        .unwrap_err();
    assert_eq!(validation_fields(err), vec!["email", "username"]);
}

#[tokio::test]
async fn test_signup_reports_every_bad_field() {
    let h = harness();
    let err = h
        .identity
        .create_identity(SignUp {
            username: "1abcdefg".to_string(),
            email: "not-an-email".to_string(),
            password: "asdf1234!!".to_string(),
            password_confirmation: "asdf1234!?".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(validation_fields(err), vec!["email", "password", "username"]);
}

#[tokio::test]
async fn test_authenticate_hides_why_login_failed() {
    let h = harness();
    let (_, actor) = h.user("zxcvbnasdf_").await;

    assert!(h.identity.authenticate("zxcvbnasdf_", PASSWORD).await.is_ok());
    assert!(matches!(
        h.identity.authenticate("zxcvbnasdf_", "wrong1234!!").await,
        Err(DomainError::InvalidCredentials)
    ));
    assert!(matches!(
        h.identity.authenticate("nobody_here", PASSWORD).await,
        Err(DomainError::InvalidCredentials)
    ));

    h.identity.deactivate(Some(&actor), PASSWORD).await.unwrap();
    assert!(matches!(
        h.identity.authenticate("zxcvbnasdf_", PASSWORD).await,
        Err(DomainError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn test_deactivate_requires_password_and_hides_profile() {
    let h = harness();
    let (user, actor) = h.user("zxcvbnasdf_").await;

    let err = h
        .identity
        .deactivate(Some(&actor), "wrong1234!!")
        .await
        .unwrap_err();
    assert_eq!(validation_fields(err), vec!["password"]);

    let user_after = h.identity.deactivate(Some(&actor), PASSWORD).await.unwrap();
    assert!(!user_after.is_active);

    assert!(matches!(
        h.identity.get_profile(user.id).await,
        Err(DomainError::Deactivated { .. })
    ));
    assert!(matches!(
        h.identity.find_active(user.id).await,
        Err(DomainError::Deactivated { .. })
    ));
}

#[tokio::test]
async fn test_update_credentials() {
    let h = harness();
    let (_, actor) = h.user("zxcvbnasdf_").await;
    h.user("takenname_").await;

    let err = h
        .identity
        .update_credentials(
            Some(&actor),
            CredentialChanges {
                current_password: "wrong1234!!".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(validation_fields(err), vec!["current_password"]);

    let err = h
        .identity
        .update_credentials(
            Some(&actor),
            CredentialChanges {
                current_password: PASSWORD.to_string(),
                username: Some("takenname_".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(validation_fields(err), vec!["username"]);

    let updated = h
        .identity
        .update_credentials(
            Some(&actor),
            CredentialChanges {
                current_password: PASSWORD.to_string(),
                new_password: Some("qwer5678!!".to_string()),
                new_password_confirmation: Some("qwer5678!!".to_string()),
                username: Some("renamed_user".to_string()),
                email: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.username, "renamed_user");

    assert!(h.identity.authenticate("renamed_user", "qwer5678!!").await.is_ok());
    assert!(h.identity.authenticate("renamed_user", PASSWORD).await.is_err());
}

#[tokio::test]
async fn test_profile_edit_is_owner_only() {
    let h = harness();
    let (owner, owner_actor) = h.user("zxcvbnasdf_").await;
    let (_, other) = h.user("otheruser_").await;

    let changes = || ProfileChanges {
        bio: Some("안녕하세요".to_string()),
        image: None,
    };

    assert!(matches!(
        h.identity.update_profile(None, owner.id, changes()).await,
        Err(DomainError::AuthenticationRequired)
    ));
    assert!(matches!(
        h.identity
            .update_profile(Some(&other), owner.id, changes())
            .await,
        Err(DomainError::AuthorizationDenied)
    ));

    let profile = h
        .identity
        .update_profile(Some(&owner_actor), owner.id, changes())
        .await
        .unwrap();
    assert_eq!(profile.bio.as_deref(), Some("안녕하세요"));
}

// ── content ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_article_title_bound() {
    let h = harness();
    let (_, actor) = h.user("zxcvbnasdf_").await;

    let ok = h
        .content
        .create_article(
            Some(&actor),
            NewArticle {
                title: "가".repeat(30),
                content: "본문".to_string(),
            },
        )
        .await;
    assert!(ok.is_ok());

    let err = h
        .content
        .create_article(
            Some(&actor),
            NewArticle {
                title: "가".repeat(31),
                content: "본문".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(validation_fields(err), vec!["title"]);
}

#[tokio::test]
async fn test_anonymous_writes_need_authentication_first() {
    let h = harness();
    let missing = uuid::Uuid::new_v4();

    assert!(matches!(
        h.content
            .create_article(
                None,
                NewArticle {
                    title: "t".to_string(),
                    content: "c".to_string(),
                },
            )
            .await,
        Err(DomainError::AuthenticationRequired)
    ));
    // Even for a missing article, anonymity is reported before existence.
    assert!(matches!(
        h.content.delete_article(None, missing).await,
        Err(DomainError::AuthenticationRequired)
    ));
    assert!(matches!(
        h.relations.toggle_like(None, missing).await,
        Err(DomainError::AuthenticationRequired)
    ));
}

#[tokio::test]
async fn test_article_mutation_is_author_only() {
    let h = harness();
    let (_, author) = h.user("zxcvbnasdf_").await;
    let (_, other) = h.user("otheruser_").await;
    let id = h.article(&author, "제목").await;

    let changes = || ArticleChanges {
        title: Some("바뀐 제목".to_string()),
        content: None,
    };

    assert!(matches!(
        h.content.update_article(Some(&other), id, changes()).await,
        Err(DomainError::AuthorizationDenied)
    ));
    assert!(matches!(
        h.content.delete_article(Some(&other), id).await,
        Err(DomainError::AuthorizationDenied)
    ));

    let updated = h
        .content
        .update_article(Some(&author), id, changes())
        .await
        .unwrap();
    assert_eq!(updated.title, "바뀐 제목");
    assert_eq!(updated.content, "본문");
}

#[tokio::test]
async fn test_delete_article_cascades() {
    let h = harness();
    let (_, author) = h.user("zxcvbnasdf_").await;
    let (_, reader) = h.user("otheruser_").await;
    let id = h.article(&author, "제목").await;

    h.content
        .create_comment(
            Some(&reader),
            id,
            NewComment {
                content: "댓글".to_string(),
            },
        )
        .await
        .unwrap();
    h.relations.toggle_like(Some(&reader), id).await.unwrap();
    h.relations.toggle_bookmark(Some(&reader), id).await.unwrap();

    h.content.delete_article(Some(&author), id).await.unwrap();

    assert!(matches!(
        h.content.get_article(id).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(
        !h.relations
            .contains(RelationKind::Like, reader.user_id, id)
            .await
            .unwrap()
    );
    let bookmarks = h
        .feed
        .bookmarks(Some(&reader), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(bookmarks.total, 0);
}

#[tokio::test]
async fn test_listing_is_newest_first_and_paginated() {
    let h = harness();
    let (_, author) = h.user("zxcvbnasdf_").await;
    for i in 0..12 {
        h.article(&author, &format!("글 {i}")).await;
    }

    let first = h
        .content
        .list_articles(&ArticleFilter::All, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(first.total, 12);
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.items[0].title, "글 11");
    assert_eq!(first.items[0].author, "zxcvbnasdf_");
    assert!(first.has_next());

    let second = h
        .content
        .list_articles(&ArticleFilter::All, PageRequest::new(2, 10))
        .await
        .unwrap();
    assert_eq!(second.items.len(), 2);
    assert_eq!(second.items[1].title, "글 0");
    assert!(!second.has_next());
}

#[tokio::test]
async fn test_comments() {
    let h = harness();
    let (_, author) = h.user("zxcvbnasdf_").await;
    let (_, other) = h.user("otheruser_").await;
    let first = h.article(&author, "첫 글").await;
    let second = h.article(&author, "둘째 글").await;

    let err = h
        .content
        .create_comment(
            Some(&author),
            first,
            NewComment {
                content: "a".repeat(51),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(validation_fields(err), vec!["content"]);

    let comment = h
        .content
        .create_comment(
            Some(&author),
            first,
            NewComment {
                content: "a".repeat(50),
            },
        )
        .await
        .unwrap();

    // Addressed through the wrong article.
    assert!(matches!(
        h.content.delete_comment(Some(&author), second, comment.id).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(matches!(
        h.content
            .update_comment(
                Some(&other),
                first,
                comment.id,
                CommentChanges {
                    content: "수정".to_string()
                },
            )
            .await,
        Err(DomainError::AuthorizationDenied)
    ));

    let detail = h.content.get_article(first).await.unwrap();
    assert_eq!(detail.comment_count, 1);

    h.content
        .delete_comment(Some(&author), first, comment.id)
        .await
        .unwrap();
    assert!(h.content.list_comments(first).await.unwrap().is_empty());
}

// ── relations ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_like_toggles_and_counts() {
    let h = harness();
    let (_, author) = h.user("zxcvbnasdf_").await;
    let id = h.article(&author, "제목").await;

    // Liking your own article is allowed.
    assert_eq!(
        h.relations.toggle_like(Some(&author), id).await.unwrap(),
        ToggleState::Added
    );
    assert_eq!(h.content.get_article(id).await.unwrap().likes_count, 1);

    assert_eq!(
        h.relations.toggle_like(Some(&author), id).await.unwrap(),
        ToggleState::Removed
    );
    assert_eq!(h.content.get_article(id).await.unwrap().likes_count, 0);
}

#[tokio::test]
async fn test_concurrent_toggles_keep_parity() {
    let h = harness();
    let (_, author) = h.user("zxcvbnasdf_").await;
    let id = h.article(&author, "제목").await;

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let relations = h.relations.clone();
            let actor = author.clone();
            tokio::spawn(async move { relations.toggle_like(Some(&actor), id).await })
        })
        .collect();

    let mut added = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().is_added() {
            added += 1;
        }
    }

    assert_eq!(added, 5);
    assert!(
        !h.relations
            .contains(RelationKind::Like, author.user_id, id)
            .await
            .unwrap()
    );
    assert_eq!(h.content.get_article(id).await.unwrap().likes_count, 0);
}

#[tokio::test]
async fn test_follow_rules() {
    let h = harness();
    let (me, me_actor) = h.user("zxcvbnasdf_").await;
    let (them, _) = h.user("otheruser_").await;

    assert!(matches!(
        h.relations.toggle_follow(Some(&me_actor), me.id).await,
        Err(DomainError::SelfFollow)
    ));
    assert!(matches!(
        h.relations
            .toggle_follow(Some(&me_actor), uuid::Uuid::new_v4())
            .await,
        Err(DomainError::NotFound { .. })
    ));

    h.relations
        .toggle_follow(Some(&me_actor), them.id)
        .await
        .unwrap();
    let followers = h.relations.followers(them.id).await.unwrap();
    assert_eq!(followers.len(), 1);
    assert_eq!(followers[0].id, me.id);
}

#[tokio::test]
async fn test_listed_actors_skip_deactivated() {
    let h = harness();
    let (_, author) = h.user("zxcvbnasdf_").await;
    let (_, leaving) = h.user("leavinguser").await;
    let (_, staying) = h.user("stayinguser").await;
    let id = h.article(&author, "제목").await;

    h.relations.toggle_like(Some(&leaving), id).await.unwrap();
    h.relations.toggle_like(Some(&staying), id).await.unwrap();
    h.identity.deactivate(Some(&leaving), PASSWORD).await.unwrap();

    let likers = h.relations.likers(id).await.unwrap();
    assert_eq!(likers.len(), 1);
    assert_eq!(likers[0].username, "stayinguser");
}

// ── feed ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_feed() {
    let h = harness();
    let (_, reader) = h.user("zxcvbnasdf_").await;
    let (followed, followed_actor) = h.user("followeduser").await;
    let (_, stranger) = h.user("strangeruser").await;

    assert!(matches!(
        h.feed.get_feed(None, PageRequest::default()).await,
        Err(DomainError::AuthenticationRequired)
    ));
    assert_eq!(
        h.feed
            .get_feed(Some(&reader), PageRequest::default())
            .await
            .unwrap(),
        Feed::Empty
    );

    h.article(&followed_actor, "오래된 글").await;
    h.article(&stranger, "남의 글").await;
    h.article(&followed_actor, "새 글").await;
    h.relations
        .toggle_follow(Some(&reader), followed.id)
        .await
        .unwrap();

    let Feed::Articles(page) = h
        .feed
        .get_feed(Some(&reader), PageRequest::default())
        .await
        .unwrap()
    else {
        panic!("expected articles");
    };
    let titles: Vec<_> = page.items.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["새 글", "오래된 글"]);
}

#[tokio::test]
async fn test_bookmark_list() {
    let h = harness();
    let (_, author) = h.user("zxcvbnasdf_").await;
    let (_, reader) = h.user("otheruser_").await;
    let kept = h.article(&author, "저장").await;
    h.article(&author, "안 저장").await;

    h.relations.toggle_bookmark(Some(&reader), kept).await.unwrap();

    let page = h
        .feed
        .bookmarks(Some(&reader), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, kept);
}

#[tokio::test]
async fn test_verify_credential_round_trip() {
    let h = harness();
    let (user, _) = h.user("zxcvbnasdf_").await;

    assert!(h.identity.verify_credential(&user, PASSWORD).unwrap());
    assert!(!h.identity.verify_credential(&user, "wrong1234!!").unwrap());
}

#[tokio::test]
async fn test_toggle_round_trip() {
    let h = harness();
    let (_, author) = h.user("zxcvbnasdf_").await;
    let (_, reader) = h.user("otheruser_").await;
    let id = h.article(&author, "제목").await;

    let mut states = Vec::new();
    for _ in 0..3 {
        states.push(h.relations.toggle_bookmark(Some(&reader), id).await.unwrap());
    }
    assert_eq!(
        states,
        vec![ToggleState::Added, ToggleState::Removed, ToggleState::Added]
    );

    h.relations.toggle_bookmark(Some(&reader), id).await.unwrap();
    assert!(
        !h.relations
            .contains(RelationKind::Bookmark, reader.user_id, id)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_feed_covers_every_followed_author_only() {
    let h = harness();
    let (_, reader) = h.user("zxcvbnasdf_").await;
    let (u2, a2_author) = h.user("seconduser").await;
    let (u3, a3_author) = h.user("thirduser_").await;
    let (_, a4_author) = h.user("fourthuser").await;

    let a2 = h.article(&a2_author, "A2").await;
    let a3 = h.article(&a3_author, "A3").await;
    let a4 = h.article(&a4_author, "A4").await;
    h.relations.toggle_follow(Some(&reader), u2.id).await.unwrap();
    h.relations.toggle_follow(Some(&reader), u3.id).await.unwrap();

    let Feed::Articles(page) = h
        .feed
        .get_feed(Some(&reader), PageRequest::default())
        .await
        .unwrap()
    else {
        panic!("expected articles");
    };
    let ids: Vec<_> = page.items.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![a3, a2]);
    assert!(!ids.contains(&a4));
}

#[tokio::test]
async fn test_deactivation_keeps_authored_articles_readable() {
    let h = harness();
    let (user, actor) = h.user("zxcvbnasdf_").await;
    let id = h.article(&actor, "남는 글").await;

    h.identity.deactivate(Some(&actor), PASSWORD).await.unwrap();

    // The profile row is still there; only reads through the profile are hidden.
    assert!(
        quill_core::ports::BaseRepository::<quill_core::domain::Profile, uuid::Uuid>::find_by_id(
            h.repos.profiles.as_ref(),
            user.id
        )
        .await
        .unwrap()
        .is_some()
    );
    let detail = h.content.get_article(id).await.unwrap();
    assert_eq!(detail.author, "zxcvbnasdf_");
}

#[tokio::test]
async fn test_deleting_identity_cascades_to_content() {
    let h = harness();
    let (user, author) = h.user("zxcvbnasdf_").await;
    let (_, reader) = h.user("otheruser_").await;
    let id = h.article(&author, "제목").await;
    let comment = h
        .content
        .create_comment(
            Some(&reader),
            id,
            NewComment {
                content: "댓글".to_string(),
            },
        )
        .await
        .unwrap();

    h.repos.users.delete(user.id).await.unwrap();

    assert!(matches!(
        h.content.get_article(id).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(
        quill_core::ports::BaseRepository::<quill_core::domain::Comment, uuid::Uuid>::find_by_id(
            h.repos.comments.as_ref(),
            comment.id
        )
        .await
        .unwrap()
        .is_none()
    );
}

#[tokio::test]
async fn test_listing_counters_are_per_article() {
    let h = harness();
    let (_, author) = h.user("zxcvbnasdf_").await;
    let (_, reader) = h.user("qwertyasdf_").await;
    let quiet = h.article(&author, "조용한 글").await;
    let busy = h.article(&author, "인기 글").await;

    h.relations.toggle_like(Some(&author), busy).await.unwrap();
    h.relations.toggle_like(Some(&reader), busy).await.unwrap();
    h.content
        .create_comment(
            Some(&reader),
            busy,
            NewComment {
                content: "댓글".to_string(),
            },
        )
        .await
        .unwrap();

    let page = h
        .content
        .list_articles(&ArticleFilter::All, PageRequest::default())
        .await
        .unwrap();
    let by_id = |id| page.items.iter().find(|a| a.id == id).unwrap();

    assert_eq!(by_id(busy).likes_count, 2);
    assert_eq!(by_id(busy).comment_count, 1);
    assert_eq!(by_id(quiet).likes_count, 0);
    assert_eq!(by_id(quiet).comment_count, 0);
}

#[tokio::test]
async fn test_page_past_the_end_is_empty() {
    let h = harness();
    let (_, author) = h.user("zxcvbnasdf_").await;
    h.article(&author, "제목").await;

    let page = h
        .content
        .list_articles(&ArticleFilter::All, PageRequest::new(u64::MAX, 10))
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total, 1);
    assert!(!page.has_next());
}
