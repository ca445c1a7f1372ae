/// Who is calling, and from where.
///
/// The platform injects these ids into every request; here they are carried
/// explicitly so services never reach for ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    /// Game post the request originates from.
    pub post_id: Option<String>,
    /// Community owning the post.
    pub community_id: String,
    /// Logged-in user, absent for anonymous visitors.
    pub user_id: Option<String>,
}

impl CallerContext {
    /// Context for an anonymous visitor of `post_id`.
    pub fn anonymous(post_id: impl Into<String>, community_id: impl Into<String>) -> Self {
        Self {
            post_id: Some(post_id.into()),
            community_id: community_id.into(),
            user_id: None,
        }
    }

    /// Context for `user_id` playing on `post_id`.
    pub fn user(
        post_id: impl Into<String>,
        community_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::anonymous(post_id, community_id)
        }
    }
}
