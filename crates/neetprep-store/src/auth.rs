//! Sign-in from configuration.

use neetprep_core::traits::AuthProvider;

/// A fixed user id, or nobody. An empty id counts as signed out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticAuth {
    user_id: Option<String>,
}

impl StaticAuth {
    pub fn new(user_id: Option<String>) -> Self {
        Self {
            user_id: user_id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
        }
    }

    pub fn signed_in(user_id: &str) -> Self {
        Self::new(Some(user_id.to_string()))
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl AuthProvider for StaticAuth {
    fn current_user_id(&self) -> Option<String> {
        self.user_id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_ids_are_signed_out() {
        assert_eq!(StaticAuth::new(Some("  ".into())).current_user_id(), None);
        assert_eq!(StaticAuth::anonymous().current_user_id(), None);
        assert_eq!(
            StaticAuth::signed_in(" u1 ").current_user_id().as_deref(),
            Some("u1")
        );
    }
}
