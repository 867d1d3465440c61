use clap::ValueEnum;
use serde::Deserialize;
use std::fmt;

/// The three resource kinds served by the API, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ResourceKind {
    #[default]
    Characters,
    Episodes,
    Locations,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Characters,
        ResourceKind::Episodes,
        ResourceKind::Locations,
    ];

    /// Path segment under the API base.
    pub fn api_path(self) -> &'static str {
        match self {
            ResourceKind::Characters => "characters",
            ResourceKind::Episodes => "episodes",
            ResourceKind::Locations => "locations",
        }
    }

    pub fn next(self) -> ResourceKind {
        match self {
            ResourceKind::Characters => ResourceKind::Episodes,
            ResourceKind::Episodes => ResourceKind::Locations,
            ResourceKind::Locations => ResourceKind::Characters,
        }
    }

    pub fn prev(self) -> ResourceKind {
        match self {
            ResourceKind::Characters => ResourceKind::Locations,
            ResourceKind::Episodes => ResourceKind::Characters,
            ResourceKind::Locations => ResourceKind::Episodes,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Characters => write!(f, "Characters"),
            ResourceKind::Episodes => write!(f, "Episodes"),
            ResourceKind::Locations => write!(f, "Locations"),
        }
    }
}

/// Envelope around one page of API results. An empty `results` array
/// (or a missing one) is the exhaustion signal.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// A Simpsons character. Every field except the name may be missing;
/// absent fields suppress the corresponding card element.
#[derive(Debug, Clone, Deserialize)]
pub struct Character {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub portrait_path: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub phrases: Vec<String>,
}

/// An episode of the show.
#[derive(Debug, Clone, Deserialize)]
pub struct Episode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub season: Option<u32>,
    #[serde(default)]
    pub episode_number: Option<u32>,
    #[serde(default)]
    pub airdate: Option<String>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
}

/// A Springfield location.
#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(rename = "use", default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub image_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_cycle_is_closed() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.next().prev(), kind);
            assert_eq!(kind.prev().next(), kind);
        }
    }

    #[test]
    fn page_without_results_field_is_empty() {
        let page: Page<Character> = serde_json::from_str(r#"{"count": 0}"#).unwrap();
        assert!(page.results.is_empty());
    }

    #[test]
    fn character_with_sparse_fields_parses() {
        let json = r#"{"results": [{"name": "Ralph Wiggum"}]}"#;
        let page: Page<Character> = serde_json::from_str(json).unwrap();
        assert_eq!(page.results.len(), 1);
        let ralph = &page.results[0];
        assert_eq!(ralph.name, "Ralph Wiggum");
        assert!(ralph.portrait_path.is_none());
        assert!(ralph.phrases.is_empty());
    }

    #[test]
    fn location_use_field_is_renamed() {
        let json = r#"{"name": "Moe's Tavern", "town": "Springfield", "use": "Bar"}"#;
        let moes: Location = serde_json::from_str(json).unwrap();
        assert_eq!(moes.purpose.as_deref(), Some("Bar"));
    }
}
