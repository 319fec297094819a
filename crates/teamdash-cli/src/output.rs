//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use teamdash_core::models::UNASSIGNED_LABEL;
use teamdash_core::{DashboardView, EntityStore, Notice, Server, ServerStats, UserStats, UserView};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// A server with its owner's name resolved
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerEntry<'a> {
    #[serde(flatten)]
    server: &'a Server,
    assigned_user: Option<&'a str>,
    ip_count: usize,
    domain_count: usize,
}

impl<'a> ServerEntry<'a> {
    fn new(server: &'a Server, store: &'a EntityStore) -> Self {
        Self {
            server,
            assigned_user: store.assigned_user_name(server),
            ip_count: server.ip_count(),
            domain_count: server.domain_count(),
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print one page of the server table
    pub fn print_servers(&self, view: &DashboardView<'_>, store: &EntityStore) {
        let servers = view.page_items();
        match self.format {
            OutputFormat::Human => {
                if view.all.is_empty() {
                    println!("No servers found.");
                    return;
                }
                for server in servers {
                    println!(
                        "{} | {:<24} | {:<15} | {:<9} | {:<16} | {} IP(s), {} domain(s)",
                        short_id(&server.id),
                        truncate(&server.name, 24),
                        server.main_ip,
                        server.status.as_str(),
                        truncate(assigned_label(server, store), 16),
                        server.ip_count(),
                        server.domain_count()
                    );
                }
                if servers.is_empty() {
                    println!("(page {} is empty)", view.current_page);
                }
                println!(
                    "\nPage {} of {} - {} server(s)",
                    view.current_page,
                    view.total_pages,
                    view.all.len()
                );
            }
            OutputFormat::Json => {
                let entries: Vec<_> = servers.iter().map(|s| ServerEntry::new(s, store)).collect();
                print_json(&serde_json::json!({
                    "servers": entries,
                    "page": view.current_page,
                    "totalPages": view.total_pages,
                    "total": view.all.len(),
                }));
            }
            OutputFormat::Quiet => {
                for server in servers {
                    println!("{}", server.id);
                }
            }
        }
    }

    /// Print a single server with its IPs and domains
    pub fn print_server(&self, server: &Server, store: &EntityStore) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", server.id);
                println!("Name:     {}", server.name);
                println!("Main IP:  {}", server.main_ip);
                println!("Status:   {}", server.status);
                println!("Assigned: {}", assigned_label(server, store));
                if !server.notes.is_empty() {
                    println!("Notes:    {}", truncate_line(&server.notes, 60));
                }

                println!();
                println!("── IPs ({}) ──", server.ip_count());
                for ip in &server.ips {
                    println!("{}  {}", short_id(&ip.id), ip.address);
                    for domain in &ip.domains {
                        println!("    {} ({})", domain.domain, domain.kind);
                    }
                }
            }
            OutputFormat::Json => print_json(&ServerEntry::new(server, store)),
            OutputFormat::Quiet => println!("{}", server.id),
        }
    }

    /// Print the user roster
    pub fn print_users(&self, view: &UserView<'_>) {
        match self.format {
            OutputFormat::Human => {
                if view.entries.is_empty() {
                    println!("No users found.");
                    return;
                }
                for entry in &view.entries {
                    println!(
                        "{} | {:<24} | {} server(s)",
                        short_id(&entry.user.id),
                        truncate(&entry.user.name, 24),
                        entry.server_count
                    );
                }
                println!(
                    "\n{} user(s) - {} assigned, {} unassigned",
                    view.stats.total, view.stats.assigned, view.stats.unassigned
                );
            }
            OutputFormat::Json => {
                let users: Vec<_> = view
                    .entries
                    .iter()
                    .map(|entry| {
                        serde_json::json!({
                            "id": entry.user.id,
                            "name": entry.user.name,
                            "serverCount": entry.server_count,
                        })
                    })
                    .collect();
                print_json(&serde_json::json!({ "users": users, "stats": view.stats }));
            }
            OutputFormat::Quiet => {
                for entry in &view.entries {
                    println!("{}", entry.user.id);
                }
            }
        }
    }

    /// Print dashboard statistics
    pub fn print_stats(&self, servers: &ServerStats, users: &UserStats) {
        match self.format {
            OutputFormat::Human => {
                println!("teamdash Stats");
                println!("==============");
                println!();
                println!("Servers:");
                println!("  Total:      {}", servers.total);
                println!("  Production: {}", servers.production);
                println!("  Issues:     {}", servers.issues);
                println!("  IPs:        {}", servers.total_ips);
                println!("  Domains:    {}", servers.total_domains);
                println!();
                println!("Users:");
                println!("  Total:      {}", users.total);
                println!("  Assigned:   {}", users.assigned);
                println!("  Unassigned: {}", users.unassigned);
            }
            OutputFormat::Json => {
                print_json(&serde_json::json!({ "servers": servers, "users": users }));
            }
            OutputFormat::Quiet => {
                println!("{}", servers.total);
            }
        }
    }

    /// Print a notice emitted by the dashboard
    ///
    /// Errors go to stderr in every mode.
    pub fn notice(&self, notice: &Notice) {
        match self.format {
            OutputFormat::Human => {
                if notice.is_error() {
                    eprintln!("✗ {}", notice);
                } else {
                    println!("✓ {}", notice);
                }
            }
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "status": notice.level,
                    "title": notice.title,
                    "message": notice.description,
                });
                if notice.is_error() {
                    eprintln!("{}", json);
                } else {
                    println!("{}", json);
                }
            }
            OutputFormat::Quiet => {
                if notice.is_error() {
                    eprintln!("{}", notice);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an identifier in quiet mode only
    pub fn id(&self, id: &str) {
        if self.is_quiet() {
            println!("{}", id);
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

fn assigned_label<'a>(server: &Server, store: &'a EntityStore) -> &'a str {
    store.assigned_user_name(server).unwrap_or(UNASSIGNED_LABEL)
}

/// First 8 characters of an ID
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("ünïcödé-name", 6), "ünï...");
    }

    #[test]
    fn test_truncate_line() {
        assert_eq!(truncate_line("single line", 20), "single line");
        assert_eq!(truncate_line("rack 4\nshelf 2", 20), "rack 4");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0f8e2a6c-1234-4bcd"), "0f8e2a6c");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_assigned_label() {
        let store = EntityStore::with_data(
            vec![teamdash_core::User::new("u1", "Alice")],
            Vec::new(),
        );
        let mut server = Server {
            id: "s1".into(),
            name: "web".into(),
            main_ip: "0.0.0.0".into(),
            status: Default::default(),
            assigned_user_id: "u1".into(),
            notes: String::new(),
            ips: Vec::new(),
        };
        assert_eq!(assigned_label(&server, &store), "Alice");

        server.assigned_user_id = "gone".into();
        assert_eq!(assigned_label(&server, &store), "Unassigned");
    }

    #[test]
    fn test_server_entry_json() {
        let store = EntityStore::new();
        let server = Server {
            id: "s1".into(),
            name: "web".into(),
            main_ip: "10.0.0.1".into(),
            status: Default::default(),
            assigned_user_id: String::new(),
            notes: String::new(),
            ips: Vec::new(),
        };
        let json = serde_json::to_value(ServerEntry::new(&server, &store)).unwrap();
        assert_eq!(json["mainIp"], "10.0.0.1");
        assert_eq!(json["status"], "Test");
        assert!(json["assignedUser"].is_null());
        assert_eq!(json["ipCount"], 0);
    }
}
