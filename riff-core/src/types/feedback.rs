//! Feedback records - human ratings and outcome signals per candidate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::CandidateId;

/// Weight of the human rating in the combined reward.
const USER_WEIGHT: f64 = 0.4;
/// Weight of the real-world engagement signal in the combined reward.
const ENGAGEMENT_WEIGHT: f64 = 0.6;

/// One rating event tied to exactly one candidate.
///
/// The human rating arrives first; `engagement_score` may be back-filled
/// later from real-world performance, in which case `combined_reward` is
/// recomputed in place rather than recorded as a second event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub candidate_id: CandidateId,
    /// Human rating, 1-5.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_text: Option<String>,
    /// Whether this was the chosen candidate in its batch.
    pub selected: bool,
    /// Post-hoc engagement signal, 0-5.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engagement_score: Option<f64>,
    /// Blended reward in [0, 1], derived from the signals present.
    pub combined_reward: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedbackRecord {
    /// Create a record from a human rating.
    pub fn from_user_score(
        candidate_id: CandidateId,
        user_score: u8,
        feedback_text: Option<String>,
        selected: bool,
    ) -> Result<Self> {
        validate_user_score(user_score)?;
        let now = Utc::now();
        let mut record = Self {
            candidate_id,
            user_score: Some(user_score),
            feedback_text,
            selected,
            engagement_score: None,
            combined_reward: 0.0,
            created_at: now,
            updated_at: now,
        };
        record.combined_reward = record.derive_reward();
        Ok(record)
    }

    /// Create a record from an outcome signal that arrived before any
    /// human rating.
    pub fn from_engagement(candidate_id: CandidateId, engagement: f64) -> Result<Self> {
        validate_engagement(engagement)?;
        let now = Utc::now();
        let mut record = Self {
            candidate_id,
            user_score: None,
            feedback_text: None,
            selected: false,
            engagement_score: Some(engagement),
            combined_reward: 0.0,
            created_at: now,
            updated_at: now,
        };
        record.combined_reward = record.derive_reward();
        Ok(record)
    }

    /// Replace the human rating and recompute the reward.
    pub fn set_user_score(
        &mut self,
        user_score: u8,
        feedback_text: Option<String>,
        selected: bool,
    ) -> Result<()> {
        validate_user_score(user_score)?;
        self.user_score = Some(user_score);
        if feedback_text.is_some() {
            self.feedback_text = feedback_text;
        }
        self.selected = selected;
        self.combined_reward = self.derive_reward();
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Back-fill the engagement signal and recompute the reward.
    pub fn set_engagement(&mut self, engagement: f64) -> Result<()> {
        validate_engagement(engagement)?;
        self.engagement_score = Some(engagement);
        self.combined_reward = self.derive_reward();
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Blend of the present signals: `0.4 * user + 0.6 * engagement` when
    /// both exist, otherwise whichever one does.
    fn derive_reward(&self) -> f64 {
        let user = self.user_score.map(normalize_user_score);
        let engagement = self.engagement_score.map(normalize_engagement);
        match (user, engagement) {
            (Some(u), Some(e)) => USER_WEIGHT * u + ENGAGEMENT_WEIGHT * e,
            (Some(u), None) => u,
            (None, Some(e)) => e,
            (None, None) => 0.0,
        }
    }
}

/// Map a 1-5 rating onto [0, 1].
pub fn normalize_user_score(score: u8) -> f64 {
    (f64::from(score) - 1.0) / 4.0
}

/// Map a 0-5 engagement score onto [0, 1].
pub fn normalize_engagement(score: f64) -> f64 {
    score / 5.0
}

fn validate_user_score(score: u8) -> Result<()> {
    if !(1..=5).contains(&score) {
        return Err(CoreError::OutOfRange {
            field: "user_score",
            value: f64::from(score),
            expected: "1..=5",
        });
    }
    Ok(())
}

fn validate_engagement(score: f64) -> Result<()> {
    if !(0.0..=5.0).contains(&score) {
        return Err(CoreError::OutOfRange {
            field: "engagement_score",
            value: score,
            expected: "0..=5",
        });
    }
    Ok(())
}
