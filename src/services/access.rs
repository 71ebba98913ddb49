// src/services/access.rs

use crate::models::quiz::{Quiz, Visibility};

/// Authorization oracle consulted before any submission write.
///
/// The full invitation system lives in an external service; this trait is the
/// seam it plugs into. The default gate covers what can be decided from quiz
/// configuration alone.
pub trait AttemptGate: Send + Sync {
    fn may_attempt(&self, user_id: i64, quiz: &Quiz) -> bool;
}

/// Published public quizzes are open to everyone; creators may always attempt
/// their own quizzes (drafts and private ones included).
pub struct VisibilityGate;

impl AttemptGate for VisibilityGate {
    fn may_attempt(&self, user_id: i64, quiz: &Quiz) -> bool {
        if quiz.is_published && quiz.visibility == Visibility::Public {
            return true;
        }
        quiz.creator_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::ScoringPolicy;

    fn quiz(creator_id: i64, is_published: bool, visibility: Visibility) -> Quiz {
        Quiz {
            id: 1,
            title: "q".to_string(),
            description: String::new(),
            creator_id,
            is_published,
            visibility,
            allow_multiple_attempts: false,
            max_attempts: None,
            scoring_policy: ScoringPolicy::Best,
            created_at: None,
        }
    }

    #[test]
    fn published_public_quiz_is_open() {
        let gate = VisibilityGate;
        assert!(gate.may_attempt(42, &quiz(1, true, Visibility::Public)));
    }

    #[test]
    fn drafts_and_private_quizzes_are_creator_only() {
        let gate = VisibilityGate;
        assert!(!gate.may_attempt(42, &quiz(1, false, Visibility::Public)));
        assert!(!gate.may_attempt(42, &quiz(1, true, Visibility::Private)));
        assert!(gate.may_attempt(1, &quiz(1, false, Visibility::Public)));
        assert!(gate.may_attempt(1, &quiz(1, true, Visibility::Private)));
    }
}
