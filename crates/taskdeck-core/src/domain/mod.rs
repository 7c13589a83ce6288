//! Domain model (IDs, tasks, sessions, list queries, card state, errors).
//!
//! ネットワークにも時計にも触らない純粋な型とルールだけを置く。

pub mod card;
pub mod errors;
pub mod ids;
pub mod list_query;
pub mod notice;
pub mod session;
pub mod task;
pub mod user;
pub mod validation;

pub use card::{CardBadge, CardDraft, CardError, CardMode, DeleteAffordance, SelectedCardState};
pub use errors::{ClientError, ValidationError};
pub use ids::{TaskId, UserId};
pub use list_query::{DEFAULT_LIMIT, Filters, ListMode, ListQuery, ListSource, PageInfo};
pub use notice::{Notice, NoticeLevel};
pub use session::{SessionContext, SessionStore};
pub use task::{Category, Task, TaskFields, TaskPage};
pub use user::{Credentials, PasswordChange, PasswordReset, ProfileUpdate, SignupRequest, UserProfile};
