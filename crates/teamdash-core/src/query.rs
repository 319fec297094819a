//! Query pipeline: filter, sort and paginate the server table
//!
//! Everything here is a pure function of an `EntityStore` and a
//! `ViewState`. Views borrow from the store, so they are rebuilt after
//! every change rather than kept up to date.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::Serialize;

use crate::config::DEFAULT_PAGE_SIZE;
use crate::models::{ParseEnumError, Server, ServerStatus, User};
use crate::store::EntityStore;

/// Column the server table can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Name,
    MainIp,
    Status,
    AssignedUser,
    IpsCount,
    DomainsCount,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::Name,
        SortKey::MainIp,
        SortKey::Status,
        SortKey::AssignedUser,
        SortKey::IpsCount,
        SortKey::DomainsCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::MainIp => "main-ip",
            SortKey::Status => "status",
            SortKey::AssignedUser => "user",
            SortKey::IpsCount => "ips",
            SortKey::DomainsCount => "domains",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "name" => Ok(SortKey::Name),
            "main-ip" | "mainip" | "ip" => Ok(SortKey::MainIp),
            "status" => Ok(SortKey::Status),
            "user" | "assigned-user" | "assigned" => Ok(SortKey::AssignedUser),
            "ips" | "ips-count" => Ok(SortKey::IpsCount),
            "domains" | "domains-count" => Ok(SortKey::DomainsCount),
            _ => Err(ParseEnumError {
                kind: "sort key",
                value: s.to_string(),
                expected: "name, main-ip, status, user, ips, domains",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Active sort column and direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn asc(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Desc,
        }
    }
}

/// Search terms, sort and page of the presentation
///
/// Changing the server search, the sort or the page size moves back to
/// page 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    server_search: String,
    user_search: String,
    sort: Option<SortConfig>,
    page: usize,
    page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl ViewState {
    pub fn new(page_size: usize) -> Self {
        Self {
            server_search: String::new(),
            user_search: String::new(),
            sort: None,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn server_search(&self) -> &str {
        &self.server_search
    }

    pub fn user_search(&self) -> &str {
        &self.user_search
    }

    pub fn sort(&self) -> Option<SortConfig> {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_server_search(&mut self, term: impl Into<String>) {
        let term = term.into();
        if term != self.server_search {
            self.server_search = term;
            self.page = 1;
        }
    }

    pub fn set_user_search(&mut self, term: impl Into<String>) {
        self.user_search = term.into();
    }

    /// Advance the sort cycle for `key`
    ///
    /// The same key goes ascending, descending, then unsorted. A different
    /// key starts ascending.
    pub fn toggle_sort(&mut self, key: SortKey) {
        self.sort = match self.sort {
            Some(SortConfig {
                key: current,
                direction: SortDirection::Asc,
            }) if current == key => Some(SortConfig::desc(key)),
            Some(SortConfig {
                key: current,
                direction: SortDirection::Desc,
            }) if current == key => None,
            _ => Some(SortConfig::asc(key)),
        };
        self.page = 1;
    }

    /// Set the sort directly (no cycling)
    pub fn set_sort(&mut self, sort: Option<SortConfig>) {
        self.sort = sort;
        self.page = 1;
    }

    /// Set the current page (pages start at 1)
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }
}

// ==================== Filtering ====================

/// Servers matching a search term
///
/// The lowercase term is matched as a substring of the lowercase name,
/// the raw main IP, or the lowercase name of the assigned user.
pub fn filter_servers<'a>(store: &'a EntityStore, term: &str) -> Vec<&'a Server> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return store.servers().iter().collect();
    }

    store
        .servers()
        .iter()
        .filter(|server| {
            server.name.to_lowercase().contains(&term)
                || server.main_ip.contains(&term)
                || store
                    .assigned_user_name(server)
                    .is_some_and(|name| name.to_lowercase().contains(&term))
        })
        .collect()
}

/// Users whose name contains the search term (case-insensitive)
pub fn filter_users<'a>(users: &'a [User], term: &str) -> Vec<&'a User> {
    let term = term.trim().to_lowercase();
    users
        .iter()
        .filter(|user| term.is_empty() || user.name.to_lowercase().contains(&term))
        .collect()
}

// ==================== Sorting ====================

/// Stable sort of servers in place
///
/// Unassigned servers stay last when sorting by assigned user, whatever
/// the direction.
pub fn sort_servers(store: &EntityStore, servers: &mut [&Server], sort: Option<SortConfig>) {
    let Some(SortConfig { key, direction }) = sort else {
        return;
    };

    let directed = |ordering: Ordering| match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    };

    match key {
        SortKey::AssignedUser => servers.sort_by(|a, b| {
            let a = store.assigned_user_name(a).map(str::to_lowercase);
            let b = store.assigned_user_name(b).map(str::to_lowercase);
            match (a, b) {
                (Some(a), Some(b)) => directed(a.cmp(&b)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }),
        SortKey::Name => {
            servers.sort_by(|a, b| directed(a.name.to_lowercase().cmp(&b.name.to_lowercase())))
        }
        SortKey::MainIp => servers
            .sort_by(|a, b| directed(a.main_ip.to_lowercase().cmp(&b.main_ip.to_lowercase()))),
        SortKey::Status => servers.sort_by(|a, b| directed(status_key(a.status).cmp(&status_key(b.status)))),
        SortKey::IpsCount => servers.sort_by(|a, b| directed(a.ip_count().cmp(&b.ip_count()))),
        SortKey::DomainsCount => {
            servers.sort_by(|a, b| directed(a.domain_count().cmp(&b.domain_count())))
        }
    }
}

fn status_key(status: ServerStatus) -> String {
    status.as_str().to_lowercase()
}

// ==================== Pagination ====================

/// Number of pages for `len` items, never less than 1
pub fn total_pages(len: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    len.div_ceil(page_size).max(1)
}

/// Index range of `page` within `len` items
///
/// A page past the end yields an empty range.
pub fn page_range(len: usize, page: usize, page_size: usize) -> Range<usize> {
    let page_size = page_size.max(1);
    let start = page.saturating_sub(1).saturating_mul(page_size);
    if start >= len {
        return len..len;
    }
    start..(start + page_size).min(len)
}

/// Slice of `items` for `page`
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    &items[page_range(items.len(), page, page_size)]
}

// ==================== Views ====================

/// Summary counts over a set of servers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ServerStats {
    pub total: usize,
    pub production: usize,
    /// Down plus timed out
    pub issues: usize,
    pub total_ips: usize,
    pub total_domains: usize,
}

impl ServerStats {
    pub fn from_servers<'a>(servers: impl IntoIterator<Item = &'a Server>) -> Self {
        servers.into_iter().fold(Self::default(), |mut stats, server| {
            stats.total += 1;
            if server.status == ServerStatus::Production {
                stats.production += 1;
            }
            if server.status.is_issue() {
                stats.issues += 1;
            }
            stats.total_ips += server.ip_count();
            stats.total_domains += server.domain_count();
            stats
        })
    }
}

/// Filtered, sorted and paginated server table
#[derive(Debug, Clone)]
pub struct DashboardView<'a> {
    /// Every server passing the filter, in sort order
    pub all: Vec<&'a Server>,
    pub range: Range<usize>,
    pub current_page: usize,
    pub total_pages: usize,
    /// Computed over `all`
    pub stats: ServerStats,
}

impl<'a> DashboardView<'a> {
    /// Servers on the current page
    pub fn page_items(&self) -> &[&'a Server] {
        &self.all[self.range.clone()]
    }
}

/// Run the full filter → sort → paginate pipeline
pub fn build_server_view<'a>(store: &'a EntityStore, state: &ViewState) -> DashboardView<'a> {
    let mut all = filter_servers(store, state.server_search());
    sort_servers(store, &mut all, state.sort());

    let stats = ServerStats::from_servers(all.iter().copied());
    DashboardView {
        range: page_range(all.len(), state.page(), state.page_size()),
        current_page: state.page(),
        total_pages: total_pages(all.len(), state.page_size()),
        all,
        stats,
    }
}

/// Roster counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub total: usize,
    /// Users owning at least one server
    pub assigned: usize,
    pub unassigned: usize,
}

/// A user with the number of servers assigned to them
#[derive(Debug, Clone, Copy)]
pub struct UserEntry<'a> {
    pub user: &'a User,
    pub server_count: usize,
}

/// Filtered user roster
#[derive(Debug, Clone)]
pub struct UserView<'a> {
    pub entries: Vec<UserEntry<'a>>,
    /// Computed over every user, not just the filtered ones
    pub stats: UserStats,
}

pub fn build_user_view<'a>(store: &'a EntityStore, state: &ViewState) -> UserView<'a> {
    let assigned = store
        .users()
        .iter()
        .filter(|user| store.servers_assigned_to(&user.id) > 0)
        .count();

    let entries = filter_users(store.users(), state.user_search())
        .into_iter()
        .map(|user| UserEntry {
            user,
            server_count: store.servers_assigned_to(&user.id),
        })
        .collect();

    UserView {
        entries,
        stats: UserStats {
            total: store.users().len(),
            assigned,
            unassigned: store.users().len() - assigned,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Domain, DomainKind, Ip};

    fn server(id: &str, name: &str, main_ip: &str, status: ServerStatus, user: &str) -> Server {
        Server {
            id: id.to_string(),
            name: name.to_string(),
            main_ip: main_ip.to_string(),
            status,
            assigned_user_id: user.to_string(),
            notes: String::new(),
            ips: Vec::new(),
        }
    }

    fn with_ips(mut server: Server, domains_per_ip: &[usize]) -> Server {
        for (i, count) in domains_per_ip.iter().enumerate() {
            let ip_id = format!("{}-ip{}", server.id, i);
            server.ips.push(Ip {
                id: ip_id.clone(),
                address: format!("10.1.0.{}", i + 1),
                server_id: server.id.clone(),
                domains: (0..*count)
                    .map(|d| Domain {
                        id: format!("{}-d{}", ip_id, d),
                        domain: format!("d{}.example.com", d),
                        kind: DomainKind::Found,
                        ip_id: ip_id.clone(),
                    })
                    .collect(),
            });
        }
        server
    }

    fn store() -> EntityStore {
        EntityStore::with_data(
            vec![User::new("u1", "Alice"), User::new("u2", "bob")],
            vec![
                with_ips(server("s1", "web-1", "10.0.0.1", ServerStatus::Production, "u1"), &[2, 1]),
                with_ips(server("s2", "DB-1", "10.0.0.2", ServerStatus::Down, ""), &[]),
                with_ips(server("s3", "cache", "192.168.1.5", ServerStatus::Test, "u2"), &[0]),
                with_ips(server("s4", "api", "10.0.0.4", ServerStatus::TimedOut, "ghost"), &[1, 1, 1]),
            ],
        )
    }

    fn ids(servers: &[&Server]) -> Vec<String> {
        servers.iter().map(|s| s.id.clone()).collect()
    }

    #[test]
    fn test_blank_search_returns_everything() {
        let store = store();
        assert_eq!(filter_servers(&store, "").len(), 4);
        assert_eq!(filter_servers(&store, "   ").len(), 4);
        assert_eq!(filter_users(store.users(), "").len(), 2);
    }

    #[test]
    fn test_search_matches_name_ip_and_user() {
        let store = store();
        assert_eq!(ids(&filter_servers(&store, "db")), vec!["s2"]);
        assert_eq!(ids(&filter_servers(&store, "192.168")), vec!["s3"]);
        assert_eq!(ids(&filter_servers(&store, "ALICE")), vec!["s1"]);
        assert!(filter_servers(&store, "nothing").is_empty());
    }

    #[test]
    fn test_dangling_user_does_not_match() {
        let store = store();
        assert!(filter_servers(&store, "ghost").is_empty());
    }

    #[test]
    fn test_user_search() {
        let store = store();
        let found = filter_users(store.users(), "BO");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "bob");
    }

    #[test]
    fn test_sort_by_name_case_insensitive() {
        let store = store();
        let mut servers = filter_servers(&store, "");
        sort_servers(&store, &mut servers, Some(SortConfig::asc(SortKey::Name)));
        assert_eq!(ids(&servers), vec!["s4", "s3", "s2", "s1"]);

        sort_servers(&store, &mut servers, Some(SortConfig::desc(SortKey::Name)));
        assert_eq!(ids(&servers), vec!["s1", "s2", "s3", "s4"]);
    }

    #[test]
    fn test_opposite_directions_reverse() {
        let store = store();
        for key in [SortKey::Name, SortKey::MainIp, SortKey::Status, SortKey::IpsCount] {
            let mut asc = filter_servers(&store, "");
            sort_servers(&store, &mut asc, Some(SortConfig::asc(key)));
            let mut desc = filter_servers(&store, "");
            sort_servers(&store, &mut desc, Some(SortConfig::desc(key)));

            let mut reversed = ids(&desc);
            reversed.reverse();
            assert_eq!(ids(&asc), reversed, "key {}", key);
        }
    }

    #[test]
    fn test_sort_by_user_keeps_unassigned_last() {
        let store = store();
        let mut servers = filter_servers(&store, "");

        sort_servers(&store, &mut servers, Some(SortConfig::asc(SortKey::AssignedUser)));
        assert_eq!(ids(&servers), vec!["s1", "s3", "s2", "s4"]);

        sort_servers(&store, &mut servers, Some(SortConfig::desc(SortKey::AssignedUser)));
        assert_eq!(ids(&servers), vec!["s3", "s1", "s2", "s4"]);
    }

    #[test]
    fn test_sort_by_counts_is_numeric() {
        let store = store();
        let mut servers = filter_servers(&store, "");
        sort_servers(&store, &mut servers, Some(SortConfig::desc(SortKey::IpsCount)));
        assert_eq!(ids(&servers), vec!["s4", "s1", "s3", "s2"]);

        // ties keep their current relative order
        sort_servers(&store, &mut servers, Some(SortConfig::asc(SortKey::DomainsCount)));
        assert_eq!(ids(&servers), vec!["s3", "s2", "s4", "s1"]);
    }

    #[test]
    fn test_toggle_cycle() {
        let mut state = ViewState::default();
        state.set_page(3);

        state.toggle_sort(SortKey::Name);
        assert_eq!(state.sort(), Some(SortConfig::asc(SortKey::Name)));
        assert_eq!(state.page(), 1);

        state.toggle_sort(SortKey::Name);
        assert_eq!(state.sort(), Some(SortConfig::desc(SortKey::Name)));

        state.toggle_sort(SortKey::Name);
        assert_eq!(state.sort(), None);

        state.toggle_sort(SortKey::Name);
        state.toggle_sort(SortKey::Status);
        assert_eq!(state.sort(), Some(SortConfig::asc(SortKey::Status)));
    }

    #[test]
    fn test_third_toggle_restores_original_order() {
        let store = store();
        let mut state = ViewState::default();
        let original = ids(&build_server_view(&store, &state).all);

        for _ in 0..3 {
            state.toggle_sort(SortKey::Name);
        }
        assert_eq!(ids(&build_server_view(&store, &state).all), original);
    }

    #[test]
    fn test_pagination_bounds() {
        let items: Vec<usize> = (0..23).collect();

        assert_eq!(total_pages(items.len(), 10), 3);
        assert_eq!(paginate(&items, 1, 10).len(), 10);
        assert_eq!(paginate(&items, 3, 10), &[20, 21, 22]);
        assert!(paginate(&items, 4, 10).is_empty());
        assert!(paginate(&items, 100, 10).is_empty());

        for page in 1..=3 {
            let expected = 10.min(items.len() - (page - 1) * 10);
            assert_eq!(paginate(&items, page, 10).len(), expected);
        }
    }

    #[test]
    fn test_pagination_of_empty_list() {
        let items: Vec<usize> = Vec::new();
        assert_eq!(total_pages(0, 10), 1);
        assert!(paginate(&items, 1, 10).is_empty());
    }

    #[test]
    fn test_page_resets() {
        let mut state = ViewState::new(2);
        state.set_page(2);
        state.set_server_search("web");
        assert_eq!(state.page(), 1);

        state.set_page(2);
        state.set_server_search("web");
        assert_eq!(state.page(), 2, "same term keeps the page");

        state.set_page_size(0);
        assert_eq!(state.page_size(), 1);
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn test_server_view() {
        let store = store();
        let mut state = ViewState::new(3);
        state.set_page(2);

        let view = build_server_view(&store, &state);
        assert_eq!(view.all.len(), 4);
        assert_eq!(view.total_pages, 2);
        assert_eq!(view.current_page, 2);
        assert_eq!(ids(view.page_items()), vec!["s4"]);
        assert_eq!(
            view.stats,
            ServerStats {
                total: 4,
                production: 1,
                issues: 2,
                total_ips: 6,
                total_domains: 6,
            }
        );
    }

    #[test]
    fn test_stats_follow_filter() {
        let store = store();
        let mut state = ViewState::default();
        state.set_server_search("web");
        let view = build_server_view(&store, &state);
        assert_eq!(view.stats.total, 1);
        assert_eq!(view.stats.total_domains, 3);
    }

    #[test]
    fn test_user_view() {
        let store = store();
        let mut state = ViewState::default();
        let view = build_user_view(&store, &state);
        assert_eq!(
            view.stats,
            UserStats {
                total: 2,
                assigned: 2,
                unassigned: 0,
            }
        );
        assert_eq!(view.entries[0].server_count, 1);

        state.set_user_search("ali");
        let view = build_user_view(&store, &state);
        assert_eq!(view.entries.len(), 1);
        assert_eq!(view.stats.total, 2);
    }

    #[test]
    fn test_sort_key_parse() {
        assert_eq!("main_ip".parse::<SortKey>().unwrap(), SortKey::MainIp);
        assert_eq!("User".parse::<SortKey>().unwrap(), SortKey::AssignedUser);
        for key in SortKey::ALL {
            assert_eq!(key.as_str().parse::<SortKey>().unwrap(), key);
        }
        assert!("color".parse::<SortKey>().is_err());
    }
}
