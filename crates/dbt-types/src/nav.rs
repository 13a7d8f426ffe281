//! Typed navigation surface.
//!
//! Every top-level page and every dashboard tab is an enum variant, so an
//! unknown page name fails at parse time instead of rendering nothing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{ParseEnumError, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Page {
    Home,
    About,
    Guidelines,
    Contact,
    Helpdesk,
    Landing,
    Dashboard(Role),
    Login(Role),
}

impl Page {
    /// Public pages get the site header and footer; dashboards and login
    /// screens draw their own frame.
    pub fn shows_chrome(self) -> bool {
        !matches!(self, Page::Dashboard(_) | Page::Login(_))
    }

    /// Where a successful login on this page lands. Other pages stay put.
    pub fn after_login(self) -> Page {
        match self {
            Page::Login(role) => Page::Dashboard(role),
            other => other,
        }
    }

    /// Where the back button of a login page goes.
    pub fn back(self) -> Option<Page> {
        match self {
            Page::Login(_) => Some(Page::Landing),
            _ => None,
        }
    }
}

fn role_slug(role: Role) -> &'static str {
    match role {
        Role::Student => "student",
        Role::Institute => "institution",
        Role::Panchayat => "panchayat",
        Role::Admin => "admin",
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Page::Home => f.write_str("home"),
            Page::About => f.write_str("about"),
            Page::Guidelines => f.write_str("guidelines"),
            Page::Contact => f.write_str("contact"),
            Page::Helpdesk => f.write_str("helpdesk"),
            Page::Landing => f.write_str("landing"),
            Page::Dashboard(role) => f.write_str(role_slug(*role)),
            Page::Login(role) => write!(f, "{}-login", role_slug(*role)),
        }
    }
}

impl FromStr for Page {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let page = match s {
            "home" => Page::Home,
            "about" => Page::About,
            "guidelines" => Page::Guidelines,
            "contact" => Page::Contact,
            "helpdesk" => Page::Helpdesk,
            "landing" => Page::Landing,
            other => match other.strip_suffix("-login") {
                Some(role) => Page::Login(role.parse().map_err(|_| ParseEnumError {
                    kind: "page",
                    value: s.to_string(),
                })?),
                None => Page::Dashboard(other.parse().map_err(|_| ParseEnumError {
                    kind: "page",
                    value: s.to_string(),
                })?),
            },
        };
        Ok(page)
    }
}

impl TryFrom<String> for Page {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Page> for String {
    fn from(page: Page) -> Self {
        page.to_string()
    }
}

/// Serializable tab descriptor handed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabEntry {
    pub id: &'static str,
    pub label: &'static str,
}

macro_rules! dashboard_tabs {
    ($name:ident { $($variant:ident => ($id:literal, $label:literal)),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn id(self) -> &'static str {
                match self {
                    $($name::$variant => $id),+
                }
            }

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            pub fn entry(self) -> TabEntry {
                TabEntry { id: self.id(), label: self.label() }
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($id => Ok($name::$variant),)+
                    other => Err(ParseEnumError { kind: "tab", value: other.to_string() }),
                }
            }
        }
    };
}

dashboard_tabs!(StudentTab {
    Home => ("home", "Dashboard"),
    Awareness => ("awareness", "Awareness"),
    Verification => ("verification", "Verification"),
    Quiz => ("quiz", "Quiz"),
    Downloads => ("downloads", "Downloads"),
    Support => ("support", "Support"),
});

dashboard_tabs!(InstituteTab {
    Home => ("home", "Dashboard"),
    Students => ("students", "Students"),
    Upload => ("upload", "Upload Data"),
    Reports => ("reports", "Reports"),
    Notices => ("notices", "Notices"),
    Resources => ("resources", "Resources"),
});

dashboard_tabs!(PanchayatTab {
    Home => ("home", "Dashboard"),
    Students => ("students", "Students"),
    Events => ("events", "Events"),
    Reports => ("reports", "Reports"),
    Resources => ("resources", "Resources"),
    Map => ("map", "Coverage Map"),
});

dashboard_tabs!(AdminTab {
    Home => ("home", "Dashboard"),
    Analytics => ("analytics", "Analytics"),
    Users => ("users", "User Management"),
    Approvals => ("approvals", "Approvals"),
    Reports => ("reports", "Reports"),
    Logs => ("logs", "System Logs"),
    Settings => ("settings", "Settings"),
});

pub fn tabs_for(role: Role) -> Vec<TabEntry> {
    match role {
        Role::Student => StudentTab::ALL.iter().map(|t| t.entry()).collect(),
        Role::Institute => InstituteTab::ALL.iter().map(|t| t.entry()).collect(),
        Role::Panchayat => PanchayatTab::ALL.iter().map(|t| t.entry()).collect(),
        Role::Admin => AdminTab::ALL.iter().map(|t| t.entry()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_names_roundtrip() {
        let pages = [
            Page::Home,
            Page::Landing,
            Page::Dashboard(Role::Institute),
            Page::Login(Role::Panchayat),
            Page::Login(Role::Student),
        ];
        for page in pages {
            assert_eq!(page.to_string().parse::<Page>().unwrap(), page);
        }
        assert_eq!("institution-login".parse::<Page>().unwrap(), Page::Login(Role::Institute));
    }

    #[test]
    fn unknown_pages_are_rejected() {
        assert!("dashboard".parse::<Page>().is_err());
        assert!("mentor-login".parse::<Page>().is_err());
        assert!(serde_json::from_str::<Page>("\"nowhere\"").is_err());
    }

    #[test]
    fn chrome_is_hidden_on_dashboards_and_logins() {
        assert!(Page::Home.shows_chrome());
        assert!(Page::Helpdesk.shows_chrome());
        assert!(!Page::Dashboard(Role::Admin).shows_chrome());
        assert!(!Page::Login(Role::Student).shows_chrome());
    }

    #[test]
    fn login_leads_to_matching_dashboard() {
        assert_eq!(
            Page::Login(Role::Admin).after_login(),
            Page::Dashboard(Role::Admin)
        );
        assert_eq!(Page::Login(Role::Admin).back(), Some(Page::Landing));
        assert_eq!(Page::Home.after_login(), Page::Home);
        assert_eq!(Page::Home.back(), None);
    }

    #[test]
    fn tabs_parse_by_id() {
        assert_eq!("map".parse::<PanchayatTab>().unwrap(), PanchayatTab::Map);
        assert!("map".parse::<AdminTab>().is_err());
        assert_eq!(tabs_for(Role::Student)[2].id, "verification");
        assert_eq!(tabs_for(Role::Admin).len(), 7);
    }
}
