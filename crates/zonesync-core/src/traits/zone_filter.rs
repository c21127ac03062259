/// Predicate deciding which store zones the reconciler manages
pub trait ZoneFilter: Send + Sync {
    fn matches(&self, zone: &str) -> bool;
}

impl<F> ZoneFilter for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn matches(&self, zone: &str) -> bool {
        self(zone)
    }
}

/// Suffix-list filter; an empty list accepts every zone
#[derive(Debug, Clone, Default)]
pub struct DomainFilter {
    domains: Vec<String>,
}

impl DomainFilter {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            domains: domains
                .into_iter()
                .map(|d| d.as_ref().trim().trim_matches('.').to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }
}

impl ZoneFilter for DomainFilter {
    fn matches(&self, zone: &str) -> bool {
        if self.domains.is_empty() {
            return true;
        }
        let zone = zone.trim_end_matches('.').to_ascii_lowercase();
        self.domains.iter().any(|d| {
            zone == *d
                || zone
                    .strip_suffix(d.as_str())
                    .is_some_and(|head| head.ends_with('.'))
        })
    }
}
