//! 积分完整流程集成测试
//!
//! 基于内存仓储走通注册、分类、投稿、审核、评论、参与活动与排行榜

mod common;

use common::{memory_services, register};
use ecopoints::EcoPointsError;
use ecopoints::models::{ContentKind, ContentRef, ContentStatus, Level, PointsAction};
use ecopoints::repository::{PointsLedgerRepositoryTrait, UserRepositoryTrait};
use ecopoints::service::{AwardRequest, ClassificationResult, Moderator, PageRequest};

fn plastic(points_earned: i64) -> ClassificationResult {
    ClassificationResult {
        category: "plastic".to_string(),
        confidence: 92.5,
        points_earned,
    }
}

#[tokio::test]
async fn test_new_user_classifies_once() {
    let (services, _) = memory_services();
    let user = register(&services, "alice").await;
    assert_eq!(user.total_points, 0);
    assert_eq!(user.level, Level::Beginner);

    let receipt = services
        .activity
        .record_classification("alice", &plastic(1))
        .await
        .unwrap();

    assert_eq!(receipt.new_total, 1);
    assert_eq!(receipt.new_level, Level::Beginner);
    assert!(!receipt.leveled_up);
    assert_eq!(services.queries.total_points("alice").await.unwrap(), 1);

    let history = services
        .queries
        .history("alice", PageRequest::first(10))
        .await
        .unwrap();
    assert_eq!(history.entries.len(), 1);
    assert_eq!(history.entries[0].action, PointsAction::Classification);
    assert!(history.entries[0].description.starts_with("Classified plastic"));
}

#[tokio::test]
async fn test_classifier_suggestion_does_not_change_award() {
    let (services, _) = memory_services();
    register(&services, "alice").await;

    let receipt = services
        .activity
        .record_classification("alice", &plastic(10))
        .await
        .unwrap();
    assert_eq!(receipt.points, 1);
}

#[tokio::test]
async fn test_blog_submit_then_approve() {
    let (services, store) = memory_services();
    register(&services, "author").await;
    let admin = Moderator::admin("admin-1");

    let submitted = services.activity.submit_blog("author").await.unwrap();
    assert_eq!(submitted.result.status, ContentStatus::Pending);
    assert_eq!(submitted.reward.receipt().unwrap().new_total, 10);

    let blog = submitted.result.content_ref();
    let approved = services.moderation.approve(blog, &admin).await.unwrap();
    assert_eq!(approved.content.status, ContentStatus::Approved);
    assert_eq!(approved.content.moderated_by.as_deref(), Some("admin-1"));
    assert_eq!(approved.reward.unwrap().new_total, 35);

    let err = services.moderation.reject(blog, &admin).await.unwrap_err();
    assert!(matches!(
        err,
        EcoPointsError::NotPending {
            current: ContentStatus::Approved,
            ..
        }
    ));
    assert_eq!(services.queries.total_points("author").await.unwrap(), 35);

    let entries = store.list_by_ref(&blog.to_string()).await.unwrap();
    let actions: Vec<PointsAction> = entries.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![PointsAction::ArticleCreated, PointsAction::BlogPublished]
    );
}

#[tokio::test]
async fn test_second_approval_awards_nothing() {
    let (services, _) = memory_services();
    register(&services, "author").await;
    let admin = Moderator::admin("admin-1");

    let blog = services.activity.submit_blog("author").await.unwrap().result;
    services
        .moderation
        .approve(blog.content_ref(), &admin)
        .await
        .unwrap();

    let err = services
        .moderation
        .approve(blog.content_ref(), &Moderator::admin("admin-2"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_PENDING");
    assert_eq!(services.queries.total_points("author").await.unwrap(), 35);
}

#[tokio::test]
async fn test_campaign_rejected_by_other_admin() {
    let (services, store) = memory_services();
    register(&services, "organizer").await;

    let created = services.activity.create_campaign("organizer").await.unwrap();
    assert_eq!(created.reward.receipt().unwrap().new_total, 10);

    let campaign = created.result.content_ref();
    let rejected = services
        .moderation
        .reject(campaign, &Moderator::admin("admin-2"))
        .await
        .unwrap();
    assert_eq!(rejected.content.status, ContentStatus::Rejected);
    assert!(rejected.reward.is_none());

    let err = services
        .moderation
        .approve(campaign, &Moderator::admin("admin-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, EcoPointsError::NotPending { .. }));

    assert_eq!(services.queries.total_points("organizer").await.unwrap(), 10);
    let rewarded = store.list_by_ref(&campaign.to_string()).await.unwrap();
    assert!(
        rewarded
            .iter()
            .all(|e| e.action != PointsAction::CampaignApproved)
    );
}

#[tokio::test]
async fn test_non_admin_cannot_moderate() {
    let (services, _) = memory_services();
    register(&services, "author").await;
    let blog = services.activity.submit_blog("author").await.unwrap().result;

    let err = services
        .moderation
        .approve(blog.content_ref(), &Moderator::member("author"))
        .await
        .unwrap_err();
    assert!(matches!(err, EcoPointsError::Forbidden { .. }));

    let current = services.moderation.get(blog.content_ref()).await.unwrap();
    assert!(current.is_pending());
}

#[tokio::test]
async fn test_join_campaign_twice() {
    let (services, _) = memory_services();
    register(&services, "organizer").await;
    register(&services, "volunteer").await;

    let campaign = services
        .activity
        .create_campaign("organizer")
        .await
        .unwrap()
        .result;

    let joined = services
        .activity
        .join_campaign("volunteer", campaign.id)
        .await
        .unwrap();
    assert_eq!(joined.reward.receipt().unwrap().new_total, 3);

    let err = services
        .activity
        .join_campaign("volunteer", campaign.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EcoPointsError::AlreadyJoined { .. }));
    assert_eq!(services.queries.total_points("volunteer").await.unwrap(), 3);

    let participants = services.activity.participants(campaign.id).await.unwrap();
    assert_eq!(participants.len(), 1);
}

#[tokio::test]
async fn test_join_unknown_campaign() {
    let (services, _) = memory_services();
    register(&services, "volunteer").await;

    let err = services
        .activity
        .join_campaign("volunteer", 404)
        .await
        .unwrap_err();
    assert!(matches!(err, EcoPointsError::ContentNotFound(c) if c == ContentRef::campaign(404)));
}

#[tokio::test]
async fn test_blog_id_is_not_a_campaign() {
    let (services, _) = memory_services();
    register(&services, "author").await;
    let blog = services.activity.submit_blog("author").await.unwrap().result;

    let err = services
        .activity
        .join_campaign("author", blog.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EcoPointsError::ContentNotFound(_)));
}

#[tokio::test]
async fn test_level_up_reported_on_crossing_call_only() {
    let (services, _) = memory_services();
    register(&services, "author").await;
    let admin = Moderator::admin("admin-1");

    let submitted = services.activity.submit_blog("author").await.unwrap();
    let mut flags = vec![submitted.reward.receipt().unwrap().leveled_up];

    let blog = submitted.result.content_ref();
    let approved = services.moderation.approve(blog, &admin).await.unwrap();
    flags.push(approved.reward.unwrap().leveled_up);

    let mut last_total = 35;
    for _ in 0..3 {
        let receipt = services
            .activity
            .comment_on_blog("author", blog.id)
            .await
            .unwrap();
        last_total = receipt.new_total;
        flags.push(receipt.leveled_up);
    }

    assert_eq!(last_total, 50);
    assert_eq!(flags, vec![false, false, false, false, true]);
    assert_eq!(
        services.queries.level("author").await.unwrap(),
        Level::EcoExplorer
    );

    let receipt = services
        .activity
        .record_classification("author", &plastic(1))
        .await
        .unwrap();
    assert!(!receipt.leveled_up);
}

#[tokio::test]
async fn test_comment_requires_approved_blog() {
    let (services, _) = memory_services();
    register(&services, "author").await;
    register(&services, "reader").await;
    let blog = services.activity.submit_blog("author").await.unwrap().result;

    let err = services
        .activity
        .comment_on_blog("reader", blog.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EcoPointsError::ContentNotApproved(_)));
    assert_eq!(services.queries.total_points("reader").await.unwrap(), 0);
}

#[tokio::test]
async fn test_tied_users_listing_and_rank() {
    let (services, _) = memory_services();
    for id in ["early", "late", "low", "top"] {
        register(&services, id).await;
    }
    for (id, points) in [("early", 500), ("late", 500), ("low", 20), ("top", 900)] {
        services
            .rewards
            .award(AwardRequest::new(id, PointsAction::Classification, points, "seed"))
            .await
            .unwrap();
    }

    let board = services
        .leaderboard
        .top(PageRequest::first(10))
        .await
        .unwrap();
    let order: Vec<&str> = board.entries.iter().map(|e| e.user_id.as_str()).collect();
    assert_eq!(order, vec!["top", "early", "late", "low"]);
    assert_eq!(board.entries[1].rank, 2);
    assert_eq!(board.entries[2].rank, 3);
    assert_eq!(board.pagination.total, 4);

    let early = services.leaderboard.rank_of("early").await.unwrap();
    let late = services.leaderboard.rank_of("late").await.unwrap();
    assert_eq!(early.rank, 2);
    assert_eq!(late.rank, 2);
    assert_eq!(early.level, Level::EcoChampion);
}

#[tokio::test]
async fn test_leaderboard_paging() {
    let (services, _) = memory_services();
    for i in 0..5 {
        let id = format!("user-{i}");
        register(&services, &id).await;
        services
            .rewards
            .award(AwardRequest::new(
                &id,
                PointsAction::Classification,
                (i + 1) * 10,
                "seed",
            ))
            .await
            .unwrap();
    }

    let second = services
        .leaderboard
        .top(PageRequest::new(2, 2))
        .await
        .unwrap();
    let ranks: Vec<i64> = second.entries.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![3, 4]);
    assert_eq!(second.entries[0].user_id, "user-2");
    assert_eq!(second.pagination.pages, 3);

    assert_eq!(services.leaderboard.top_n(3).await.unwrap().len(), 3);
    assert!(
        services
            .leaderboard
            .top(PageRequest::new(0, 10))
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_leaderboard_is_deterministic_with_ties() {
    let (services, _) = memory_services();
    let ids: Vec<String> = (0..7).map(|i| format!("tied-{i}")).collect();
    for id in &ids {
        register(&services, id).await;
        services
            .rewards
            .award(AwardRequest::new(id, PointsAction::Comment, 40, "seed"))
            .await
            .unwrap();
    }
    register(&services, "leader").await;
    services
        .rewards
        .award(AwardRequest::new("leader", PointsAction::Comment, 90, "seed"))
        .await
        .unwrap();

    let first = services
        .leaderboard
        .top(PageRequest::first(10))
        .await
        .unwrap();
    for _ in 0..5 {
        let again = services
            .leaderboard
            .top(PageRequest::first(10))
            .await
            .unwrap();
        assert_eq!(again, first);
    }

    let mut expected = vec!["leader".to_string()];
    expected.extend(ids.iter().cloned());
    let order: Vec<String> = first.entries.iter().map(|e| e.user_id.clone()).collect();
    assert_eq!(order, expected);

    // 跨页拼接与整页一致，同分用户不会在页间重复或丢失
    let mut paged = Vec::new();
    for page in 1..=3 {
        let board = services
            .leaderboard
            .top(PageRequest::new(page, 3))
            .await
            .unwrap();
        paged.extend(board.entries);
    }
    assert_eq!(paged, first.entries);
}

#[tokio::test]
async fn test_invalid_award_persists_nothing() {
    let (services, store) = memory_services();
    register(&services, "alice").await;

    for points in [0, -3] {
        let err = services
            .rewards
            .award(AwardRequest::new("alice", PointsAction::Comment, points, "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, EcoPointsError::InvalidAward { .. }));
    }

    assert_eq!(store.count_by_user("alice").await.unwrap(), 0);
    assert_eq!(services.queries.total_points("alice").await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_user_queries() {
    let (services, _) = memory_services();

    assert!(matches!(
        services.leaderboard.rank_of("ghost").await,
        Err(EcoPointsError::UserNotFound(_))
    ));
    assert!(matches!(
        services.queries.profile("ghost", 5).await,
        Err(EcoPointsError::UserNotFound(_))
    ));
    assert!(matches!(
        services
            .rewards
            .award(AwardRequest::from_schedule("ghost", PointsAction::Comment, "x"))
            .await,
        Err(EcoPointsError::UserNotFound(_))
    ));
    assert!(matches!(
        services.activity.submit_blog("ghost").await,
        Err(EcoPointsError::UserNotFound(_))
    ));
}

#[tokio::test]
async fn test_duplicate_registration() {
    let (services, store) = memory_services();
    register(&services, "alice").await;

    let err = services
        .activity
        .register_user(Some("alice"), "someone-else")
        .await
        .unwrap_err();
    assert!(matches!(err, EcoPointsError::UserAlreadyExists(_)));
    assert_eq!(store.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn test_history_newest_first_and_ledger_matches_total() {
    let (services, _) = memory_services();
    register(&services, "alice").await;

    services
        .activity
        .record_classification("alice", &plastic(1))
        .await
        .unwrap();
    services.activity.submit_blog("alice").await.unwrap();
    services.activity.create_campaign("alice").await.unwrap();

    let history = services
        .queries
        .history("alice", PageRequest::first(2))
        .await
        .unwrap();
    assert_eq!(history.pagination.total, 3);
    assert_eq!(history.pagination.pages, 2);
    assert_eq!(history.entries[0].action, PointsAction::CampaignCreated);
    assert_eq!(history.entries[1].action, PointsAction::ArticleCreated);

    let report = services.queries.reconcile("alice").await.unwrap();
    assert!(report.is_consistent());
    assert_eq!(report.ledger_total, 21);
    assert_eq!(services.queries.ledger_total("alice").await.unwrap(), 21);
}

#[tokio::test]
async fn test_profile_summary() {
    let (services, _) = memory_services();
    register(&services, "alice").await;
    register(&services, "bob").await;
    services
        .rewards
        .award(AwardRequest::new("bob", PointsAction::Classification, 300, "seed"))
        .await
        .unwrap();
    services.activity.submit_blog("alice").await.unwrap();

    let profile = services.queries.profile("alice", 5).await.unwrap();
    assert_eq!(profile.total_points, 10);
    assert_eq!(profile.rank, 2);
    assert_eq!(profile.next_level, Some(Level::EcoExplorer));
    assert_eq!(profile.points_to_next_level, Some(40));
    assert_eq!(profile.recent_history.len(), 1);
}

#[tokio::test]
async fn test_pending_queue_lists_oldest_first() {
    let (services, _) = memory_services();
    register(&services, "author").await;

    let first = services.activity.submit_blog("author").await.unwrap().result;
    let second = services.activity.submit_blog("author").await.unwrap().result;
    services.activity.create_campaign("author").await.unwrap();

    let queue = services
        .moderation
        .list_by_status(ContentKind::Blog, ContentStatus::Pending, PageRequest::first(10))
        .await
        .unwrap();
    let ids: Vec<i64> = queue.items.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
    assert_eq!(queue.pagination.total, 2);

    services
        .moderation
        .approve(first.content_ref(), &Moderator::admin("admin"))
        .await
        .unwrap();
    let queue = services
        .moderation
        .list_by_status(ContentKind::Blog, ContentStatus::Pending, PageRequest::first(10))
        .await
        .unwrap();
    assert_eq!(queue.items.len(), 1);
}

#[tokio::test]
async fn test_global_stats_follow_ledger() {
    let (services, _) = memory_services();
    let empty = services.queries.global_stats().await.unwrap();
    assert_eq!(empty.total_points, 0);
    assert_eq!(empty.user_count, 0);
    assert_eq!(empty.classification_count, 0);

    register(&services, "alice").await;
    register(&services, "bob").await;
    for _ in 0..3 {
        services
            .activity
            .record_classification("alice", &plastic(1))
            .await
            .unwrap();
    }
    services.activity.submit_blog("bob").await.unwrap();

    let stats = services.queries.global_stats().await.unwrap();
    assert_eq!(stats.user_count, 2);
    assert_eq!(stats.classification_count, 3);
    assert_eq!(stats.total_points, 3 + 10);
}
