use anyhow::{Context, Result};
use cookie_store::CookieStore;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};
use url::Url;

/// Hosts whose cookies carry the X login session.
const SESSION_HOSTS: &[&str] = &["x.com", "twitter.com"];

/// Load the user's X session cookies from the local browser profile.
///
/// Chrome/Chromium are tried first, then Firefox. An empty store is returned
/// when nothing could be loaded.
pub fn load_x_cookies() -> Result<CookieStore> {
    let mut cookie_store = CookieStore::default();

    let chrome_paths = vec![
        dirs::home_dir().map(|h| h.join(".config/google-chrome/Default/Cookies")),
        dirs::home_dir().map(|h| h.join(".config/chromium/Default/Cookies")),
    ];

    let mut loaded = false;

    for cookie_path in chrome_paths.into_iter().flatten() {
        if !cookie_path.exists() {
            continue;
        }
        match load_chrome_cookies_from_db(&cookie_path, &mut cookie_store) {
            Ok(count) if count > 0 => {
                info!(count, path = %cookie_path.display(), "loaded X cookies");
                loaded = true;
                break;
            }
            Ok(_) => {
                warn!(path = %cookie_path.display(), "no X cookies in browser profile");
            }
            Err(e) => {
                warn!(path = %cookie_path.display(), error = %e, "could not load cookies");
            }
        }
    }

    if !loaded {
        if let Some(firefox_path) = find_firefox_cookies() {
            match load_firefox_cookies_from_db(&firefox_path, &mut cookie_store) {
                Ok(count) if count > 0 => {
                    info!(count, path = %firefox_path.display(), "loaded X cookies");
                    loaded = true;
                }
                Ok(_) => {
                    warn!(path = %firefox_path.display(), "no X cookies in browser profile");
                }
                Err(e) => {
                    warn!(path = %firefox_path.display(), error = %e, "could not load cookies");
                }
            }
        }
    }

    if !loaded {
        warn!("no browser session for x.com found; timeline pages will be logged out");
    }

    Ok(cookie_store)
}

/// `Cookie` request header value for `url`, if any cookies apply.
pub fn cookie_header(store: &CookieStore, url: &Url) -> Option<String> {
    let header = store
        .get_request_values(url)
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ");

    if header.is_empty() {
        None
    } else {
        Some(header)
    }
}

fn is_session_host(host: &str) -> bool {
    let host = host.trim_start_matches('.');
    SESSION_HOSTS
        .iter()
        .any(|h| host == *h || host.ends_with(&format!(".{}", h)))
}

/// Browsers hold a lock on their cookie databases, so work from a copy that
/// is removed when it goes out of scope.
fn open_copy(db_path: &Path) -> Result<(NamedTempFile, Connection)> {
    let temp = NamedTempFile::new().context("Failed to create temporary cookie database")?;
    std::fs::copy(db_path, temp.path()).context("Failed to copy cookies database")?;
    let conn = Connection::open(temp.path()).context("Failed to open cookies database")?;
    Ok((temp, conn))
}

fn insert_cookie(
    cookie_store: &mut CookieStore,
    host: &str,
    path: &str,
    is_secure: bool,
    name: &str,
    value: &str,
) -> bool {
    if !is_session_host(host) {
        return false;
    }

    let cookie_str = format!(
        "{}={}; Domain={}; Path={}{}",
        name,
        value,
        host,
        path,
        if is_secure { "; Secure" } else { "" }
    );

    let url_str = format!(
        "{}://{}{}",
        if is_secure { "https" } else { "http" },
        host.trim_start_matches('.'),
        path
    );

    match (Url::parse(&url_str), cookie_store::RawCookie::parse(&cookie_str)) {
        (Ok(url), Ok(cookie)) => cookie_store.insert_raw(&cookie.into_owned(), &url).is_ok(),
        _ => false,
    }
}

fn load_chrome_cookies_from_db(db_path: &Path, cookie_store: &mut CookieStore) -> Result<usize> {
    let (_temp, conn) = open_copy(db_path)?;

    let mut stmt = conn.prepare(
        "SELECT host_key, path, is_secure, name, value
         FROM cookies
         WHERE expires_utc > ? AND name != '' AND value != ''",
    )?;

    // Chrome timestamps are microseconds since 1601-01-01
    let now = (chrono::Utc::now().timestamp() + 11_644_473_600) * 1_000_000;

    let rows = stmt.query_map([now], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut count = 0;
    for (host, path, is_secure, name, value) in rows.flatten() {
        if insert_cookie(cookie_store, &host, &path, is_secure != 0, &name, &value) {
            count += 1;
        }
    }

    Ok(count)
}

fn find_firefox_cookies() -> Option<PathBuf> {
    let firefox_dir = dirs::home_dir()?.join(".mozilla/firefox");
    if !firefox_dir.exists() {
        return None;
    }

    let profiles_ini = firefox_dir.join("profiles.ini");
    if let Ok(content) = std::fs::read_to_string(&profiles_ini) {
        if let Some(path) = default_profile_path(&content) {
            let cookies_path = firefox_dir.join(path).join("cookies.sqlite");
            if cookies_path.exists() {
                return Some(cookies_path);
            }
        }
    }

    // Fallback: any profile with cookies.sqlite
    std::fs::read_dir(&firefox_dir)
        .ok()?
        .flatten()
        .map(|entry| entry.path().join("cookies.sqlite"))
        .find(|path| path.exists())
}

/// `Path=` of the section marked `Default=1` in Firefox's profiles.ini.
fn default_profile_path(profiles_ini: &str) -> Option<String> {
    let mut current_path: Option<String> = None;
    let mut is_default = false;

    for line in profiles_ini.lines().map(str::trim) {
        if line.starts_with('[') {
            if is_default && current_path.is_some() {
                return current_path;
            }
            current_path = None;
            is_default = false;
        } else if let Some(path) = line.strip_prefix("Path=") {
            current_path = Some(path.to_string());
        } else if line == "Default=1" {
            is_default = true;
        }
    }

    if is_default {
        current_path
    } else {
        None
    }
}

fn load_firefox_cookies_from_db(db_path: &Path, cookie_store: &mut CookieStore) -> Result<usize> {
    let (_temp, conn) = open_copy(db_path)?;

    let now = chrono::Utc::now().timestamp();

    let mut stmt = conn.prepare(
        "SELECT host, path, isSecure, name, value
         FROM moz_cookies
         WHERE expiry > ? AND name != '' AND value != ''",
    )?;

    let rows = stmt.query_map([now], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut count = 0;
    for (host, path, is_secure, name, value) in rows.flatten() {
        if insert_cookie(cookie_store, &host, &path, is_secure != 0, &name, &value) {
            count += 1;
        }
    }

    Ok(count)
}
