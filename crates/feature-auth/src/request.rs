/// Headers and query parameters of an incoming request.
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
}

impl RequestParts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Parse a raw query string such as `a=1&access_token=xyz`.
    ///
    /// Pairs without `=` get an empty value. Percent-decoding is left to the
    /// caller's framework.
    pub fn with_query_string(mut self, raw: &str) -> Self {
        for pair in raw.trim_start_matches('?').split('&').filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            self.query.push((name.to_string(), value.to_string()));
        }
        self
    }

    /// First header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value of query parameter `name`, in request order.
    pub fn query_params<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a str> + 'n
    where
        'a: 'n,
    {
        self.query
            .iter()
            .filter(move |(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params(name).next()
    }
}
