use regex::Regex;
use std::collections::HashSet;

/// Post-processing step over a list of compiled URLs
pub trait Middleware {
    fn process(&self, urls: Vec<String>) -> Vec<String>;
}

/// Drops repeated URLs, keeping the first occurrence
#[derive(Debug)]
pub struct DeduplicateMiddleware;

impl Middleware for DeduplicateMiddleware {
    fn process(&self, urls: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();
        urls.into_iter()
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }
}

/// Keeps (or drops) URLs matching any of the regex patterns
#[derive(Debug)]
pub struct RegexFilterMiddleware {
    patterns: Vec<Regex>,
    include: bool,
}

impl RegexFilterMiddleware {
    /// # Arguments
    /// * `patterns` - regex patterns matched against the whole URL
    /// * `include` - keep matching URLs when true, drop them when false
    pub fn new<S: AsRef<str>>(
        patterns: &[S],
        include: bool,
    ) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns, include })
    }
}

impl Middleware for RegexFilterMiddleware {
    fn process(&self, urls: Vec<String>) -> Vec<String> {
        if self.patterns.is_empty() {
            return urls;
        }
        urls.into_iter()
            .filter(|url| {
                let matches = self.patterns.iter().any(|p| p.is_match(url));
                if self.include { matches } else { !matches }
            })
            .collect()
    }
}

/// Truncates the list to at most `limit` URLs
#[derive(Debug)]
pub struct LimitMiddleware(pub usize);

impl Middleware for LimitMiddleware {
    fn process(&self, mut urls: Vec<String>) -> Vec<String> {
        urls.truncate(self.0);
        urls
    }
}
