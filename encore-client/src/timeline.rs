//! Timeline composition
//!
//! Holds the active filter and the joined post list, newest first. Likes
//! are patched optimistically; a failed like write reconciles against a
//! refetch of the current filter.

use std::sync::Arc;

use encore_common::models::{
    AuthorSummary, Comment, LikeRef, NewComment, NewPost, SongAttachment, TimelineFilter,
    TimelinePost, UserId,
};
use encore_common::Result;
use tracing::{error, info, warn};

use crate::optimistic::OptimisticList;
use crate::store::PostStore;

/// Filtered post feed for one viewer
pub struct TimelineComposer<S: ?Sized> {
    store: Arc<S>,
    viewer: UserId,
    filter: TimelineFilter,
    posts: OptimisticList<TimelinePost>,
    /// Viewer's display info, attached to posts they submit
    author: Option<AuthorSummary>,
}

impl<S> TimelineComposer<S>
where
    S: PostStore + ?Sized,
{
    pub fn new(store: Arc<S>, viewer: UserId) -> Self {
        Self {
            store,
            viewer,
            filter: TimelineFilter::default(),
            posts: OptimisticList::default(),
            author: None,
        }
    }

    /// Cache the viewer's username and avatar
    pub fn set_author(&mut self, author: AuthorSummary) {
        self.author = Some(author);
    }

    pub fn viewer(&self) -> UserId {
        self.viewer
    }

    pub fn filter(&self) -> &TimelineFilter {
        &self.filter
    }

    pub fn posts(&self) -> &[TimelinePost] {
        self.posts.items()
    }

    /// Load posts for the current filter. On failure the list is emptied.
    pub async fn fetch(&mut self) -> Result<&[TimelinePost]> {
        let result = self.store.fetch_timeline(self.viewer, &self.filter).await;

        match result {
            Ok(posts) => {
                info!(viewer = %self.viewer, filter = %self.filter, count = posts.len(), "Fetched timeline");
                self.posts.set(posts);
                Ok(self.posts.items())
            }
            Err(e) => {
                error!(viewer = %self.viewer, filter = %self.filter, error = %e, "Failed to fetch timeline");
                self.posts.set(Vec::new());
                Err(e)
            }
        }
    }

    /// Switch filter and fetch once
    pub async fn set_filter(&mut self, filter: TimelineFilter) -> Result<&[TimelinePost]> {
        self.filter = filter;
        self.fetch().await
    }

    /// Publish a post.
    ///
    /// Under All or Follows the new post is prepended locally. Under any
    /// other filter the post may not match, so the filter resets to All and
    /// the list is refetched.
    pub async fn submit_post(
        &mut self,
        content: &str,
        song: Option<SongAttachment>,
    ) -> Result<()> {
        let new_post = NewPost::new(self.viewer, content, song)?;

        let post = match self.store.insert_post(&new_post).await {
            Ok(post) => post,
            Err(e) => {
                error!(viewer = %self.viewer, error = %e, "Failed to submit post");
                return Err(e);
            }
        };
        info!(viewer = %self.viewer, post_id = post.id, "Submitted post");

        if self.filter.admits_own_posts() {
            let entry = TimelinePost {
                post,
                author: self.author.clone(),
                likes: Vec::new(),
                comments: Vec::new(),
            };
            self.posts.confirmed_mut().insert(0, entry);
            Ok(())
        } else {
            self.filter = TimelineFilter::All;
            self.fetch().await.map(|_| ())
        }
    }

    /// Like or unlike a post, applied locally before the write
    pub async fn toggle_like(&mut self, post_id: i64, currently_liked: bool) -> Result<()> {
        let viewer = self.viewer;
        self.posts.apply(|posts| {
            if let Some(entry) = posts.iter_mut().find(|p| p.post.id == post_id) {
                if currently_liked {
                    entry.likes.retain(|like| like.user_id != viewer);
                } else if !entry.is_liked_by(viewer) {
                    entry.likes.push(LikeRef { user_id: viewer });
                }
            }
        });

        let result = if currently_liked {
            self.store.delete_like(post_id, viewer).await
        } else {
            self.store.insert_like(post_id, viewer).await
        };

        match result {
            Ok(()) => {
                self.posts.confirm();
                Ok(())
            }
            Err(e) => {
                error!(viewer = %viewer, post_id, error = %e, "Failed to update like");
                let truth = match self.store.fetch_timeline(viewer, &self.filter).await {
                    Ok(posts) => Some(posts),
                    Err(refetch) => {
                        warn!(viewer = %viewer, error = %refetch, "Refetch after failed like failed, rolling back");
                        None
                    }
                };
                self.posts.reconcile(truth);
                Err(e)
            }
        }
    }

    /// Comment on a post and append the stored comment to it.
    ///
    /// A post that is not in the current list still receives the comment
    /// in the store.
    pub async fn add_comment(&mut self, post_id: i64, text: &str) -> Result<Comment> {
        let new_comment = NewComment::new(post_id, self.viewer, text)?;

        let comment = match self.store.insert_comment(&new_comment).await {
            Ok(comment) => comment,
            Err(e) => {
                error!(viewer = %self.viewer, post_id, error = %e, "Failed to add comment");
                return Err(e);
            }
        };

        if let Some(entry) = self
            .posts
            .confirmed_mut()
            .iter_mut()
            .find(|p| p.post.id == post_id)
        {
            entry.comments.push(comment.clone());
        }
        Ok(comment)
    }
}
