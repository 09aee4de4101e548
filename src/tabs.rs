use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pane {
    Recommender,
    Search,
    Popular,
    Chatbot,
}

impl Pane {
    pub const ALL: [Pane; 4] = [Pane::Recommender, Pane::Search, Pane::Popular, Pane::Chatbot];

    pub fn id(&self) -> &'static str {
        match self {
            Pane::Recommender => "recommender",
            Pane::Search => "search",
            Pane::Popular => "popular",
            Pane::Chatbot => "chatbot",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Pane::Recommender => "Rekomendasi Film",
            Pane::Search => "Cari Film",
            Pane::Popular => "Film Populer",
            Pane::Chatbot => "Film Assistant",
        }
    }
}

impl fmt::Display for Pane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tab '{0}' (expected recommender, search, popular or chatbot)")]
pub struct UnknownPane(pub String);

impl FromStr for Pane {
    type Err = UnknownPane;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().to_lowercase();
        Pane::ALL
            .into_iter()
            .find(|pane| pane.id() == id)
            .ok_or_else(|| UnknownPane(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tab {
    pub pane: Pane,
    pub default: bool,
}

/// Which pane is visible. Exactly one is active at a time.
#[derive(Debug, Clone)]
pub struct Tabs {
    tabs: Vec<Tab>,
    active: Pane,
}

impl Default for Tabs {
    fn default() -> Self {
        Self::new(
            Pane::ALL
                .into_iter()
                .map(|pane| Tab {
                    pane,
                    default: pane == Pane::Recommender,
                })
                .collect(),
        )
    }
}

impl Tabs {
    /// Starts on the tab flagged `default`, else on the first one.
    pub fn new(tabs: Vec<Tab>) -> Self {
        let active = tabs
            .iter()
            .find(|tab| tab.default)
            .or_else(|| tabs.first())
            .map(|tab| tab.pane)
            .unwrap_or(Pane::Recommender);
        Self { tabs, active }
    }

    pub fn active(&self) -> Pane {
        self.active
    }

    pub fn is_active(&self, pane: Pane) -> bool {
        self.active == pane
    }

    pub fn panes(&self) -> impl Iterator<Item = Pane> + '_ {
        self.tabs.iter().map(|tab| tab.pane)
    }

    /// Switches to `pane` if it is one of the tabs. Returns whether it changed.
    pub fn select(&mut self, pane: Pane) -> bool {
        if self.active == pane || !self.tabs.iter().any(|tab| tab.pane == pane) {
            return false;
        }
        self.active = pane;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tabs_start_on_recommender() {
        let tabs = Tabs::default();
        assert_eq!(tabs.active(), Pane::Recommender);
        assert_eq!(tabs.panes().count(), 4);
    }

    #[test]
    fn test_first_tab_without_default() {
        let tabs = Tabs::new(vec![
            Tab { pane: Pane::Popular, default: false },
            Tab { pane: Pane::Search, default: false },
        ]);
        assert_eq!(tabs.active(), Pane::Popular);
    }

    #[test]
    fn test_select() {
        let mut tabs = Tabs::default();
        assert!(tabs.select(Pane::Chatbot));
        assert!(tabs.is_active(Pane::Chatbot));
        assert!(!tabs.is_active(Pane::Recommender));
        assert!(!tabs.select(Pane::Chatbot));

        let mut limited = Tabs::new(vec![Tab { pane: Pane::Search, default: true }]);
        assert!(!limited.select(Pane::Popular));
        assert_eq!(limited.active(), Pane::Search);
    }

    #[test]
    fn test_parse_pane() {
        assert_eq!(" Popular ".parse::<Pane>(), Ok(Pane::Popular));
        assert_eq!(Pane::Chatbot.label(), "Film Assistant");
        assert!("settings".parse::<Pane>().is_err());
    }
}
