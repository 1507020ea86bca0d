pub mod user;
pub mod subreddit;
pub mod post;
pub mod comment;
pub mod vote;

// Re-export models for convenience
pub use user::{Author, User};
pub use subreddit::{Subreddit, Subscription};
pub use post::{FeedFilter, FeedPost, PageRequest, Post, PostWithAuthor};
pub use comment::{Comment, CommentWithAuthor};
pub use vote::{current_vote, tally, CommentVote, Vote, VoteOutcome, VoteType};
