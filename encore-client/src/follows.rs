//! Follow graph

use std::sync::Arc;

use encore_common::models::{Follow, FollowUser, UserId};
use encore_common::{Error, Result};
use tracing::{error, info};

use crate::store::SocialStore;

/// Follow edges between users. Holds no state of its own.
pub struct FollowGraph<S: ?Sized> {
    store: Arc<S>,
}

impl<S> FollowGraph<S>
where
    S: SocialStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn edge(viewer: UserId, target: UserId) -> Result<Follow> {
        if viewer == target {
            return Err(Error::InvalidInput("You cannot follow yourself".to_string()));
        }
        Ok(Follow {
            follower_id: viewer,
            following_id: target,
        })
    }

    pub async fn is_following(&self, viewer: UserId, target: UserId) -> Result<bool> {
        if viewer == target {
            return Ok(false);
        }
        self.store
            .is_following(&Follow {
                follower_id: viewer,
                following_id: target,
            })
            .await
    }

    pub async fn follow(&self, viewer: UserId, target: UserId) -> Result<()> {
        let edge = Self::edge(viewer, target)?;
        self.store.insert_follow(&edge).await.inspect_err(|e| {
            error!(viewer = %viewer, target = %target, error = %e, "Failed to follow");
        })?;
        info!(viewer = %viewer, target = %target, "Followed user");
        Ok(())
    }

    pub async fn unfollow(&self, viewer: UserId, target: UserId) -> Result<()> {
        let edge = Self::edge(viewer, target)?;
        self.store.delete_follow(&edge).await.inspect_err(|e| {
            error!(viewer = %viewer, target = %target, error = %e, "Failed to unfollow");
        })?;
        info!(viewer = %viewer, target = %target, "Unfollowed user");
        Ok(())
    }

    /// Follow button: flip the edge and return the new state
    pub async fn toggle(
        &self,
        viewer: UserId,
        target: UserId,
        currently_following: bool,
    ) -> Result<bool> {
        if currently_following {
            self.unfollow(viewer, target).await?;
        } else {
            self.follow(viewer, target).await?;
        }
        Ok(!currently_following)
    }

    pub async fn followers(&self, user_id: UserId) -> Result<Vec<FollowUser>> {
        self.store.list_followers(user_id).await.inspect_err(|e| {
            error!(user_id = %user_id, error = %e, "Failed to list followers");
        })
    }

    pub async fn following(&self, user_id: UserId) -> Result<Vec<FollowUser>> {
        self.store.list_following(user_id).await.inspect_err(|e| {
            error!(user_id = %user_id, error = %e, "Failed to list following");
        })
    }
}
