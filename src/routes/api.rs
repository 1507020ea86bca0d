use axum::{routing::{get, patch, post}, Router};
use crate::AppState;
use crate::routes::{auth, comments, posts, subreddits, users, vote_routes};

pub fn routes() -> Router<AppState> {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/posts", get(posts::get_posts))
        .route("/posts/:post_id", get(posts::get_post))
        .route("/posts/:post_id/comments", get(comments::get_post_comments))
        .route("/search", get(subreddits::search))
        .route("/r/:name", get(subreddits::get_subreddit));

    // Handlers here take `AuthUser`, which rejects with 401
    let protected_routes = Router::new()
        .route("/users/me", get(users::get_current_user))
        .route("/username", patch(users::update_username))
        .route("/subreddit", post(subreddits::create_subreddit))
        .route("/subreddit/subscribe", post(subreddits::subscribe))
        .route("/subreddit/unsubscribe", post(subreddits::unsubscribe))
        .route("/subreddit/post/create", post(posts::create_post))
        .route("/subreddit/post/vote", patch(vote_routes::vote_on_post))
        .route("/subreddit/post/comment", post(comments::create_comment))
        .route("/subreddit/post/comment/vote", patch(vote_routes::vote_on_comment));

    public_routes.merge(protected_routes)
}
