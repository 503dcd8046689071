use super::schema::*;
use super::{lock, DbConn};
use rusqlite::{params, OptionalExtension, Row};

// ── Row mapping helpers ──

fn row_to_setting(row: &Row<'_>) -> rusqlite::Result<Setting> {
    Ok(Setting {
        key: row.get("key")?,
        value: row.get("value")?,
    })
}

fn row_to_search_count(row: &Row<'_>) -> rusqlite::Result<SearchCount> {
    Ok(SearchCount {
        search_term: row.get("search_term")?,
        count: row.get("count")?,
        movie_id: row.get("movie_id")?,
        poster_url: row.get("poster_url")?,
    })
}

// ── Key-value slots ──

pub fn kv_get(conn: &DbConn, key: &str) -> rusqlite::Result<Option<String>> {
    let db = lock(conn);
    db.query_row(
        "SELECT value FROM kv_store WHERE key = ?1",
        params![key],
        |row| row.get::<_, String>(0),
    )
    .optional()
}

pub fn kv_set(conn: &DbConn, key: &str, value: &str) -> rusqlite::Result<()> {
    let db = lock(conn);
    db.execute(
        "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )?;
    Ok(())
}

pub fn kv_remove(conn: &DbConn, key: &str) -> rusqlite::Result<()> {
    let db = lock(conn);
    db.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
    Ok(())
}

// ── Search counts ──

/// Bump the counter for `term`, creating it with the given representative movie.
/// Returns the count after the increment.
pub fn increment_search_count(
    conn: &DbConn,
    term: &str,
    movie_id: i64,
    poster_url: Option<&str>,
) -> rusqlite::Result<i64> {
    let db = lock(conn);
    db.execute(
        "INSERT INTO search_counts (search_term, count, movie_id, poster_url)
         VALUES (?1, 1, ?2, ?3)
         ON CONFLICT(search_term) DO UPDATE SET
            count = count + 1,
            updated_at = datetime('now')",
        params![term, movie_id, poster_url],
    )?;
    db.query_row(
        "SELECT count FROM search_counts WHERE search_term = ?1",
        params![term],
        |row| row.get(0),
    )
}

pub fn fetch_top_search_counts(conn: &DbConn, limit: usize) -> rusqlite::Result<Vec<SearchCount>> {
    let db = lock(conn);
    let mut stmt = db.prepare(
        "SELECT * FROM search_counts ORDER BY count DESC, updated_at DESC LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![limit as i64], row_to_search_count)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

// ── Settings ──

pub fn fetch_settings(conn: &DbConn) -> rusqlite::Result<Vec<Setting>> {
    let db = lock(conn);
    let mut stmt = db.prepare("SELECT * FROM settings ORDER BY key")?;
    let settings = stmt
        .query_map([], row_to_setting)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(settings)
}

pub fn set_setting(conn: &DbConn, key: &str, value: &str) -> rusqlite::Result<()> {
    let db = lock(conn);
    db.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = ?2",
        params![key, value],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn kv_roundtrip_and_remove() {
        let conn = open_in_memory().unwrap();
        assert_eq!(kv_get(&conn, "favorites").unwrap(), None);

        kv_set(&conn, "favorites", "[]").unwrap();
        kv_set(&conn, "favorites", "[1]").unwrap();
        assert_eq!(kv_get(&conn, "favorites").unwrap().as_deref(), Some("[1]"));

        kv_remove(&conn, "favorites").unwrap();
        assert_eq!(kv_get(&conn, "favorites").unwrap(), None);
    }

    #[test]
    fn increment_keeps_first_representative() {
        let conn = open_in_memory().unwrap();
        assert_eq!(increment_search_count(&conn, "naruto", 1, Some("/a.jpg")).unwrap(), 1);
        assert_eq!(increment_search_count(&conn, "naruto", 2, Some("/b.jpg")).unwrap(), 2);

        let top = fetch_top_search_counts(&conn, 10).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].movie_id, 1);
        assert_eq!(top[0].poster_url.as_deref(), Some("/a.jpg"));
        assert_eq!(top[0].count, 2);
    }

    #[test]
    fn top_counts_are_limited_and_ordered() {
        let conn = open_in_memory().unwrap();
        for (term, times) in [("a", 1), ("b", 3), ("c", 2), ("d", 5)] {
            for _ in 0..times {
                increment_search_count(&conn, term, 1, None).unwrap();
            }
        }

        let top = fetch_top_search_counts(&conn, 3).unwrap();
        let terms: Vec<&str> = top.iter().map(|r| r.search_term.as_str()).collect();
        assert_eq!(terms, vec!["d", "b", "c"]);
    }

    #[test]
    fn set_setting_upserts() {
        let conn = open_in_memory().unwrap();
        set_setting(&conn, "tmdb_token", "one").unwrap();
        set_setting(&conn, "tmdb_token", "two").unwrap();
        let token: Vec<Setting> = fetch_settings(&conn)
            .unwrap()
            .into_iter()
            .filter(|s| s.key == "tmdb_token")
            .collect();
        assert_eq!(token.len(), 1);
        assert_eq!(token[0].value, "two");
    }
}
