//! Cover lookup against the Open Library search API.
//!
//! Free-text title+author search, up to three candidate cover URLs per
//! query. Failure or an empty result is non-fatal everywhere: callers
//! proceed with no cover.

use serde::Deserialize;

const COVERS_BASE: &str = "https://covers.openlibrary.org/b";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    cover_i: Option<i64>,
    isbn: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct CoversClient {
    base_url: String,
}

impl CoversClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// Up to three cover image URLs for a title (and optional author).
    /// Docs with a cover id map to the id-based image URL; otherwise the
    /// first ISBN is used as a fallback pattern.
    pub async fn search_covers(
        &self,
        title: &str,
        author: Option<&str>,
    ) -> Result<Vec<String>, String> {
        let query = match author {
            Some(author) => format!("{} {}", title, author),
            None => title.to_owned(),
        };
        let url = format!(
            "{}/search.json?q={}&limit=3",
            self.base_url,
            urlencoding::encode(&query)
        );

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

        let resp = client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("Failed to send request: {}", e))?;

        if !resp.status().is_success() {
            return Err(format!("Open Library API returned status: {}", resp.status()));
        }

        let parsed: SearchResponse = resp
            .json()
            .await
            .map_err(|e| format!("Failed to parse JSON: {}", e))?;

        let mut covers = Vec::new();
        for doc in parsed.docs.into_iter().take(3) {
            if let Some(id) = doc.cover_i {
                covers.push(format!("{}/id/{}-L.jpg", COVERS_BASE, id));
            } else if let Some(isbn) = doc.isbn.and_then(|isbns| isbns.into_iter().next()) {
                covers.push(format!("{}/isbn/{}-L.jpg", COVERS_BASE, isbn));
            }
        }

        Ok(covers)
    }
}
