//! ユーザー・認証関連の型

use serde::{Deserialize, Serialize};

/// `/auth/me` のレスポンス
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
    pub languages: Vec<String>,
    pub is_active: bool,
    pub payout_balance: f64,
    pub reviews_done: u64,
}

impl UserProfile {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// レビュー言語（未設定なら英語）
    pub fn review_languages(&self) -> Vec<String> {
        if self.languages.is_empty() {
            vec!["en".to_string()]
        } else {
            self.languages.clone()
        }
    }
}

/// レビュー画面のステータス表示
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewerStats {
    pub total_reviews: u64,
    pub today_reviews: u64,
    pub streak: u64,
}

impl ReviewerStats {
    pub fn from_profile(profile: &UserProfile) -> Self {
        let done = profile.reviews_done;
        Self {
            total_reviews: done,
            today_reviews: done / 10,
            streak: done / 5 + 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub languages: Vec<String>,
}

/// `/auth/login`・`/auth/register` のレスポンス
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayoutRequest {
    pub amount: f64,
    pub payment_method: String,
    pub payment_details: Option<serde_json::Value>,
}

impl PayoutRequest {
    pub fn bank_transfer(amount: f64) -> Self {
        Self {
            amount,
            payment_method: "bank_transfer".to_string(),
            payment_details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reviewer_stats() {
        let profile = UserProfile {
            reviews_done: 23,
            ..Default::default()
        };
        let stats = ReviewerStats::from_profile(&profile);
        assert_eq!(stats.total_reviews, 23);
        assert_eq!(stats.today_reviews, 2);
        assert_eq!(stats.streak, 5);
    }

    #[test]
    fn test_review_languages_fallback() {
        let mut profile = UserProfile::default();
        assert_eq!(profile.review_languages(), vec!["en".to_string()]);
        profile.languages = vec!["hi".into(), "ta".into()];
        assert_eq!(profile.review_languages(), vec!["hi".to_string(), "ta".to_string()]);
    }

    #[test]
    fn test_profile_tolerates_missing_fields() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"username": "asha", "roles": ["reviewer"]}"#).unwrap();
        assert_eq!(profile.username, "asha");
        assert!(profile.has_role("reviewer"));
        assert!(!profile.has_role("operator"));
        assert_eq!(profile.payout_balance, 0.0);
    }

    #[test]
    fn test_auth_response_without_user() {
        let resp: AuthResponse =
            serde_json::from_str(r#"{"access_token": "tok", "token_type": "bearer"}"#).unwrap();
        assert_eq!(resp.access_token, "tok");
        assert!(resp.user.is_none());
    }
}
