//! Relation kinds and their remote layout.

use serde::{Deserialize, Serialize};

/// The kind of a toggleable relation.
///
/// The kind determines which remote collection holds the relation document
/// and which counter field on which parent document it adjusts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// A like on a post.
    Post,
    /// A like on a comment. Requires the owning post id as `parent_id`.
    Comment,
    /// A like on a workout.
    Workout,
    /// A saved workout.
    WorkoutSave,
    /// A follow relationship between two users.
    Follow,
}

impl RelationKind {
    /// Stable string tag, used in relation ids and wire payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Post => "post",
            RelationKind::Comment => "comment",
            RelationKind::Workout => "workout",
            RelationKind::WorkoutSave => "workout_save",
            RelationKind::Follow => "follow",
        }
    }

    /// Parse a kind from its string tag.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "post" => Some(RelationKind::Post),
            "comment" => Some(RelationKind::Comment),
            "workout" => Some(RelationKind::Workout),
            "workout_save" => Some(RelationKind::WorkoutSave),
            "follow" => Some(RelationKind::Follow),
            _ => None,
        }
    }

    /// Remote collection holding relation documents of this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            RelationKind::Post => "post_likes",
            RelationKind::Comment => "comment_likes",
            RelationKind::Workout => "workout_likes",
            RelationKind::WorkoutSave => "workout_saves",
            RelationKind::Follow => "follows",
        }
    }

    /// Root collection of the entity that carries the counter.
    ///
    /// For nested kinds this is the root of the nested path (a comment's
    /// counter lives at `posts/{parent}/comments/{target}`).
    pub fn parent_collection(&self) -> &'static str {
        match self {
            RelationKind::Post | RelationKind::Comment => "posts",
            RelationKind::Workout | RelationKind::WorkoutSave => "workouts",
            RelationKind::Follow => "users",
        }
    }

    /// Nested collection segment for kinds whose counter entity lives under
    /// a parent document.
    pub fn nested_collection(&self) -> Option<&'static str> {
        match self {
            RelationKind::Comment => Some("comments"),
            _ => None,
        }
    }

    /// The aggregate counter field on the parent document.
    pub fn counter_field(&self) -> &'static str {
        match self {
            RelationKind::Post | RelationKind::Comment | RelationKind::Workout => "like_count",
            RelationKind::WorkoutSave => "save_count",
            RelationKind::Follow => "follower_count",
        }
    }

    /// Whether this kind needs a `parent_id` to address its counter document.
    ///
    /// Only comment likes are nested: the counter lives on the owning post,
    /// not on the comment itself. All other kinds use the target id directly.
    pub fn requires_parent(&self) -> bool {
        matches!(self, RelationKind::Comment)
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [RelationKind; 5] = [
        RelationKind::Post,
        RelationKind::Comment,
        RelationKind::Workout,
        RelationKind::WorkoutSave,
        RelationKind::Follow,
    ];

    #[test]
    fn test_as_str_from_str_roundtrip() {
        for kind in ALL {
            assert_eq!(RelationKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(RelationKind::from_str("bogus"), None);
    }

    #[test]
    fn test_only_comment_requires_parent() {
        for kind in ALL {
            assert_eq!(kind.requires_parent(), kind == RelationKind::Comment);
        }
    }

    #[test]
    fn test_comment_counter_is_nested_under_post() {
        assert_eq!(RelationKind::Comment.parent_collection(), "posts");
        assert_eq!(RelationKind::Comment.nested_collection(), Some("comments"));
        assert_eq!(RelationKind::Comment.counter_field(), "like_count");
    }

    #[test]
    fn test_only_comment_is_nested() {
        for kind in ALL {
            assert_eq!(
                kind.nested_collection().is_some(),
                kind == RelationKind::Comment
            );
        }
    }

    #[test]
    fn test_collections_are_distinct() {
        let mut collections: Vec<_> = ALL.iter().map(|k| k.collection()).collect();
        collections.sort_unstable();
        collections.dedup();
        assert_eq!(collections.len(), ALL.len());
    }

    #[test]
    fn test_follow_counts_followers_on_target_user() {
        assert_eq!(RelationKind::Follow.parent_collection(), "users");
        assert_eq!(RelationKind::Follow.counter_field(), "follower_count");
        assert!(!RelationKind::Follow.requires_parent());
    }
}
