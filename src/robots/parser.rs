//! Robots.txt parser implementation
//!
//! Thin wrapper over the robotstxt crate's matcher, with an explicit
//! allow-all state for sites without a usable robots.txt.

use robotstxt::DefaultMatcher;

/// Parsed robots.txt data
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    /// Whether to allow all (true = allow all, false = parse content)
    allow_all: bool,
}

impl ParsedRobots {
    /// Creates a new ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// This is the default when robots.txt cannot be fetched or parsed.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The full URL to check
    /// * `user_agent` - The user agent string
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }

        // Parse and check on-demand; the content is fetched once per run so
        // re-parsing stays off the hot path only for the allow-all case.
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Gets the crawl delay for a specific user agent
    ///
    /// The robotstxt matcher does not expose Crawl-delay, so the directive is
    /// scanned manually. It applies to the most recent User-agent group, and a
    /// group naming our agent wins over the wildcard group.
    ///
    /// # Returns
    ///
    /// * `Some(f64)` - The crawl delay in seconds
    /// * `None` - If no crawl delay is specified
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.allow_all || self.content.is_empty() {
            return None;
        }

        let normalized_agent = user_agent.to_lowercase();
        let mut current_agents: Vec<String> = Vec::new();
        let mut wildcard_delay: Option<f64> = None;
        let mut agent_delay: Option<f64> = None;

        for line in self.content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_lowercase().as_str() {
                "user-agent" => {
                    current_agents.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    if let Ok(delay) = value.parse::<f64>() {
                        if current_agents
                            .iter()
                            .any(|ua| ua != "*" && normalized_agent.contains(ua.as_str()))
                        {
                            agent_delay = Some(delay);
                        } else if current_agents.iter().any(|ua| ua == "*") {
                            wildcard_delay = Some(delay);
                        }
                    }
                    current_agents.clear();
                }
                _ => {}
            }
        }

        agent_delay.or(wildcard_delay)
    }
}
