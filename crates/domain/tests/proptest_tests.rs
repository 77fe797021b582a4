//! Property-based tests for the article domain
//!
//! These tests use proptest to verify invariants across many random inputs.

use chrono::{TimeDelta, Utc};
use domain::{Article, ArticleDraft, ArticleId, ArticlePatch};
use proptest::prelude::*;

// ============================================================================
// ArticleId Property Tests
// ============================================================================

mod article_id_tests {
    use super::*;

    proptest! {
        #[test]
        fn next_is_strictly_greater(raw in 0u64..u64::MAX) {
            let id = ArticleId::new(raw);
            let next = id.next().unwrap();
            prop_assert!(next > id);
            prop_assert_eq!(next.value(), raw + 1);
        }

        #[test]
        fn display_parses_back(raw in any::<u64>()) {
            let id = ArticleId::new(raw);
            let parsed: ArticleId = id.to_string().parse().unwrap();
            prop_assert_eq!(parsed, id);
        }

        #[test]
        fn non_numeric_segments_never_parse(s in "[a-zA-Z_-]{1,12}") {
            prop_assert!(s.parse::<ArticleId>().is_err());
        }
    }
}

// ============================================================================
// ArticleDraft Property Tests
// ============================================================================

mod article_draft_tests {
    use super::*;

    proptest! {
        #[test]
        fn non_empty_fields_validate(
            title in ".{1,64}",
            content in ".{1,256}",
            author in ".{1,32}"
        ) {
            let draft = ArticleDraft::new(title, content, author);
            prop_assert!(draft.validated().is_ok());
        }

        #[test]
        fn any_empty_field_fails(which in 0usize..3) {
            let mut draft = ArticleDraft::new("t", "c", "a");
            match which {
                0 => draft.title.clear(),
                1 => draft.content.clear(),
                _ => draft.author.clear(),
            }
            prop_assert!(draft.validated().is_err());
        }
    }
}

// ============================================================================
// Article mutation Property Tests
// ============================================================================

mod article_mutation_tests {
    use super::*;

    proptest! {
        #[test]
        fn apply_never_touches_identity_or_creation_time(
            title in proptest::option::of(".{1,32}"),
            content in proptest::option::of(".{1,32}"),
            skew_ms in -5_000i64..5_000i64
        ) {
            let created = Utc::now();
            let mut article = Article::from_draft(
                ArticleId::new(7),
                ArticleDraft::new("t", "c", "a"),
                created,
            );

            let patch = ArticlePatch { title, content, author: None };
            article.apply(patch, created + TimeDelta::milliseconds(skew_ms));

            prop_assert_eq!(article.id, ArticleId::new(7));
            prop_assert_eq!(article.created_at, created);
            prop_assert!(article.updated_at > created);
            prop_assert_eq!(article.author.as_str(), "a");
        }
    }
}
