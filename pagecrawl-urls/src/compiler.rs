use crate::params::{raw_url_encode, ExpandedParameters};

/// Turns expanded parameters into concrete URLs.
pub trait UrlCompiler {
    /// Every combination of parameter values appended to every base URL,
    /// never more than `max_urls` results. Identical input gives identical
    /// output.
    fn compile(
        &self,
        params: &ExpandedParameters,
        base_urls: Vec<String>,
        max_urls: usize,
    ) -> Vec<String>;
}

/// Appends `&key=value` pairs in parameter-map order. Each parameter
/// multiplies the current URL list by its value set; an empty value keeps
/// the URL as it is.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryStringCompiler;

impl UrlCompiler for QueryStringCompiler {
    fn compile(
        &self,
        params: &ExpandedParameters,
        mut base_urls: Vec<String>,
        max_urls: usize,
    ) -> Vec<String> {
        base_urls.truncate(max_urls);
        params.iter().fold(base_urls, |urls, (name, values)| {
            let name = raw_url_encode(name);
            let name = name.as_str();
            urls.iter()
                .flat_map(|url| {
                    values.iter().map(move |value| {
                        let value = value.to_string();
                        if value.is_empty() {
                            url.clone()
                        } else {
                            format!("{url}&{name}={}", raw_url_encode(&value))
                        }
                    })
                })
                .take(max_urls)
                .collect()
        })
    }
}
