//! The `user`/`token` cookie pair read by the request-time gate.
//!
//! Cookies are non-HttpOnly, `Path=/`, `SameSite=Lax`, and live for the
//! configured number of days. The `user` value is JSON and travels
//! percent-encoded; `token` is already URL-safe.
use crate::config::MAX_COOKIE_DAYS;
use chrono::{DateTime, Duration, Utc};
use cookie::{Cookie, SameSite};
use dashmap::DashMap;

pub const USER_COOKIE: &str = "user";
pub const TOKEN_COOKIE: &str = "token";

/// Cookie lifetime in days, kept within `1..=MAX_COOKIE_DAYS`.
pub fn cookie_lifetime_days(days: i64) -> i64 {
    days.clamp(1, MAX_COOKIE_DAYS)
}

/// Build a session cookie with the shared attributes.
pub fn session_cookie(name: &str, value: &str, days: i64) -> Cookie<'static> {
    Cookie::build((name.to_string(), value.to_string()))
        .path("/")
        .same_site(SameSite::Lax)
        .http_only(false)
        .max_age(cookie::time::Duration::days(cookie_lifetime_days(days)))
        .build()
}

/// A cookie that tells the browser to drop `name`.
pub fn removal_cookie(name: &str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name.to_string(), String::new()))
        .path("/")
        .build();
    cookie.make_removal();
    cookie
}

#[derive(Debug, Clone)]
struct StoredCookie {
    value: String,
    expires_at: DateTime<Utc>,
}

/// In-process mirror of the browser cookie jar for native clients.
#[derive(Debug)]
pub struct CookieJar {
    max_age_days: i64,
    cookies: DashMap<String, StoredCookie>,
}

impl CookieJar {
    pub fn new(max_age_days: i64) -> Self {
        Self {
            max_age_days: cookie_lifetime_days(max_age_days),
            cookies: DashMap::new(),
        }
    }

    pub fn max_age_days(&self) -> i64 {
        self.max_age_days
    }

    pub fn set(&self, name: &str, value: &str) {
        self.cookies.insert(
            name.to_string(),
            StoredCookie {
                value: value.to_string(),
                expires_at: Utc::now() + Duration::days(self.max_age_days),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.get_at(name, Utc::now())
    }

    fn get_at(&self, name: &str, now: DateTime<Utc>) -> Option<String> {
        let expired = match self.cookies.get(name) {
            None => return None,
            Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
            Some(_) => true,
        };
        if expired {
            self.cookies.remove(name);
        }
        None
    }

    pub fn remove(&self, name: &str) {
        self.cookies.remove(name);
    }

    /// `Set-Cookie` value for `name`, or a removal cookie when unset.
    pub fn set_cookie_header(&self, name: &str) -> String {
        match self.get(name) {
            Some(value) => session_cookie(name, &value, self.max_age_days)
                .encoded()
                .to_string(),
            None => removal_cookie(name).encoded().to_string(),
        }
    }

    /// `Cookie` request header carrying every live cookie.
    pub fn cookie_header(&self) -> Option<String> {
        let now = Utc::now();
        let mut names: Vec<String> = self.cookies.iter().map(|e| e.key().clone()).collect();
        names.sort();
        let pairs: Vec<String> = names
            .into_iter()
            .filter_map(|name| {
                self.get_at(&name, now).map(|value| {
                    Cookie::new(name, value).encoded().stripped().to_string()
                })
            })
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }
}
