//! Movie data the dispatcher looks things up in.
//!
//! The real provider is external; `Catalog` is a file-backed stand-in that
//! serves the same interface.
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("missing argument `{0}`")]
    MissingArgument(&'static str),

    #[error("nothing found for {0}")]
    NotFound(String),

    #[error("lookup unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
}

impl fmt::Display for Movie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if let Some(release_date) = &self.release_date {
            write!(f, " (released {})", release_date)?;
        }
        if let Some(overview) = &self.overview {
            write!(f, ": {}", overview)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Showtime {
    pub title: String,
    pub location: String,
    pub theater: String,
    pub times: Vec<String>,
}

impl fmt::Display for Showtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.theater, self.times.join(", "))
    }
}

#[async_trait]
pub trait MovieLookup: Send + Sync {
    /// Movies in theaters now, optionally near `location`
    async fn now_playing(&self, location: Option<&str>) -> Result<Vec<Movie>, LookupError>;

    /// Showtimes for `title` around `location`
    async fn showtimes(&self, title: &str, location: &str) -> Result<Vec<Showtime>, LookupError>;
}

/// An in-memory movie catalog, usually loaded from a JSON file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub movies: Vec<Movie>,
    #[serde(default)]
    pub showtimes: Vec<Showtime>,
}

impl Catalog {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse catalog {}", path.display()))
    }
}

fn same(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[async_trait]
impl MovieLookup for Catalog {
    async fn now_playing(&self, location: Option<&str>) -> Result<Vec<Movie>, LookupError> {
        let movies: Vec<Movie> = match location {
            // Narrow to what is scheduled nearby, when the schedule knows the place
            Some(location) if self.showtimes.iter().any(|s| same(&s.location, location)) => self
                .movies
                .iter()
                .filter(|movie| {
                    self.showtimes
                        .iter()
                        .any(|s| same(&s.location, location) && same(&s.title, &movie.title))
                })
                .cloned()
                .collect(),
            _ => self.movies.clone(),
        };

        if movies.is_empty() {
            return Err(LookupError::NotFound("movies now playing".to_string()));
        }
        Ok(movies)
    }

    async fn showtimes(&self, title: &str, location: &str) -> Result<Vec<Showtime>, LookupError> {
        let showtimes: Vec<Showtime> = self
            .showtimes
            .iter()
            .filter(|s| same(&s.title, title) && same(&s.location, location))
            .cloned()
            .collect();

        if showtimes.is_empty() {
            return Err(LookupError::NotFound(format!("{} in {}", title, location)));
        }
        Ok(showtimes)
    }
}
