//! Route - 画面の一覧とアクセス制御
//!
//! 表示層がどんなものでも、「どの画面にセッションが要るか」はここで決める。

use std::fmt;
use std::str::FromStr;

use crate::domain::SessionContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Landing,
    SignUp,
    Login,
    Home,
    Profile,
    CreateTask,
    DeleteRequests,
    ForgetPassword,
    ResetPassword { email: String, token: String },
    ChangePassword,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Landing => "/".into(),
            Route::SignUp => "/sign-up".into(),
            Route::Login => "/login".into(),
            Route::Home => "/home".into(),
            Route::Profile => "/profile".into(),
            Route::CreateTask => "/create-task".into(),
            Route::DeleteRequests => "/delete-requests".into(),
            Route::ForgetPassword => "/forget-password".into(),
            Route::ResetPassword { email, token } => format!("/reset-password/{email}/{token}"),
            Route::ChangePassword => "/change-password".into(),
        }
    }

    pub fn requires_session(&self) -> bool {
        matches!(
            self,
            Route::Home
                | Route::Profile
                | Route::CreateTask
                | Route::DeleteRequests
                | Route::ChangePassword
        )
    }

    pub fn requires_admin(&self) -> bool {
        matches!(self, Route::DeleteRequests)
    }

    /// 実際に表示する画面
    ///
    /// - セッションが必要なのに無い → `/login`
    /// - admin 専用で admin でない → `/home`
    pub fn guard(self, session: Option<&SessionContext>) -> Route {
        match session {
            None if self.requires_session() => Route::Login,
            Some(s) if self.requires_admin() && !s.is_admin => Route::Home,
            _ => self,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').skip(1).collect();
        let route = match segments.as_slice() {
            [] | [""] => Route::Landing,
            ["sign-up"] => Route::SignUp,
            ["login"] => Route::Login,
            ["home"] => Route::Home,
            ["profile"] => Route::Profile,
            ["create-task"] => Route::CreateTask,
            ["delete-requests"] => Route::DeleteRequests,
            ["forget-password"] => Route::ForgetPassword,
            ["reset-password", email, token] if !email.is_empty() && !token.is_empty() => {
                Route::ResetPassword {
                    email: (*email).to_string(),
                    token: (*token).to_string(),
                }
            }
            ["change-password"] => Route::ChangePassword,
            _ => return Err(format!("unknown route: {path}")),
        };
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use rstest::rstest;

    #[rstest]
    #[case::landing("/", Route::Landing)]
    #[case::home("/home", Route::Home)]
    #[case::trailing_slash("/profile/", Route::Profile)]
    #[case::reset(
        "/reset-password/a@b.co/tok123",
        Route::ResetPassword { email: "a@b.co".into(), token: "tok123".into() }
    )]
    fn parses_paths(#[case] path: &str, #[case] expected: Route) {
        assert_eq!(path.parse::<Route>().unwrap(), expected);
    }

    #[test]
    fn unknown_paths_are_rejected() {
        assert!("/nowhere".parse::<Route>().is_err());
        assert!("/reset-password/only-email".parse::<Route>().is_err());
    }

    #[test]
    fn guard_redirects_without_session() {
        assert_eq!(Route::Home.guard(None), Route::Login);
        assert_eq!(Route::SignUp.guard(None), Route::SignUp);

        let user = SessionContext::new(UserId::new(1), false);
        let admin = SessionContext::new(UserId::new(2), true);
        assert_eq!(Route::DeleteRequests.guard(Some(&user)), Route::Home);
        assert_eq!(Route::DeleteRequests.guard(Some(&admin)), Route::DeleteRequests);
    }
}
