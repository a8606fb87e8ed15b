pub mod category;
pub mod comment;
pub mod pagination;
pub mod post;
pub mod user;

pub use category::Category;
pub use comment::{Comment, CommentForm, CommentOwnership, CommentView};
pub use pagination::{Page, PageQuery};
pub use post::{Post, PostFilter, PostForm, PostSummary, SearchForm};
pub use user::{ActivityUpdate, UpdateAccountForm, User, UserProfile};
