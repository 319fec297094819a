//! In-memory entity store
//!
//! The `EntityStore` holds the canonical collections of Users and Servers
//! (servers embed their IPs, IPs embed their domains). It always reflects
//! the last state confirmed by the remote backend.
//!
//! ## Copy-on-write
//!
//! Collections are kept behind `Arc`. Readers may hold a snapshot
//! (`servers_snapshot()`) while the store is mutated; `Arc::make_mut`
//! clones the collection in that case so the snapshot never changes.
//!
//! Every `apply_*` method is synchronous and performs no I/O. Methods
//! return `false` when the target entity is not present, in which case
//! nothing changes and the revision is not bumped.

use std::sync::Arc;

use crate::models::{Domain, Ip, Server, ServerPatch, ServerStatus, User};

/// Canonical in-memory view of users and servers
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    users: Arc<Vec<User>>,
    servers: Arc<Vec<Server>>,
    /// Bumped on every applied change
    revision: u64,
}

impl EntityStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given collections
    pub fn with_data(users: Vec<User>, servers: Vec<Server>) -> Self {
        Self {
            users: Arc::new(users),
            servers: Arc::new(servers),
            revision: 0,
        }
    }

    // ==================== Getters ====================

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    /// Shared snapshot of the user collection
    pub fn users_snapshot(&self) -> Arc<Vec<User>> {
        Arc::clone(&self.users)
    }

    /// Shared snapshot of the server collection
    pub fn servers_snapshot(&self) -> Arc<Vec<Server>> {
        Arc::clone(&self.servers)
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn server(&self, id: &str) -> Option<&Server> {
        self.servers.iter().find(|s| s.id == id)
    }

    /// Resolve the name of the user assigned to a server
    pub fn assigned_user_name(&self, server: &Server) -> Option<&str> {
        if !server.is_assigned() {
            return None;
        }
        self.user(&server.assigned_user_id).map(|u| u.name.as_str())
    }

    /// Number of servers assigned to a user
    pub fn servers_assigned_to(&self, user_id: &str) -> usize {
        self.servers
            .iter()
            .filter(|s| s.assigned_user_id == user_id)
            .count()
    }

    /// Monotonic change counter
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ==================== Mutations ====================

    /// Replace both collections wholesale (after a full fetch)
    pub fn replace_all(&mut self, users: Vec<User>, servers: Vec<Server>) {
        self.users = Arc::new(users);
        self.servers = Arc::new(servers);
        self.bump();
    }

    pub fn apply_server_status(&mut self, server_id: &str, status: ServerStatus) -> bool {
        self.with_server(server_id, |server| server.status = status)
    }

    /// Append a newly created server
    pub fn apply_new_server(&mut self, server: Server) {
        Arc::make_mut(&mut self.servers).push(server);
        self.bump();
    }

    pub fn apply_server_update(&mut self, server_id: &str, patch: &ServerPatch) -> bool {
        self.with_server(server_id, |server| patch.apply_to(server))
    }

    /// Remove a server together with its IPs and domains
    pub fn apply_server_deletion(&mut self, server_id: &str) -> bool {
        let Some(index) = self.server_index(server_id) else {
            return false;
        };
        Arc::make_mut(&mut self.servers).remove(index);
        self.bump();
        true
    }

    /// Append IPs to a server, keeping their order
    pub fn apply_new_ips(&mut self, server_id: &str, ips: Vec<Ip>) -> bool {
        self.with_server(server_id, |server| server.ips.extend(ips))
    }

    /// Remove an IP together with its domains
    pub fn apply_ip_deletion(&mut self, server_id: &str, ip_id: &str) -> bool {
        let Some(server) = self.server(server_id) else {
            return false;
        };
        if server.ip(ip_id).is_none() {
            return false;
        }
        self.with_server(server_id, |server| server.ips.retain(|ip| ip.id != ip_id))
    }

    /// Replace an IP's domain list exactly with `domains`
    pub fn apply_domains_replacement(
        &mut self,
        server_id: &str,
        ip_id: &str,
        domains: Vec<Domain>,
    ) -> bool {
        let Some(server) = self.server(server_id) else {
            return false;
        };
        if server.ip(ip_id).is_none() {
            return false;
        }
        self.with_server(server_id, |server| {
            if let Some(ip) = server.ips.iter_mut().find(|ip| ip.id == ip_id) {
                ip.domains = domains;
            }
        })
    }

    pub fn apply_new_user(&mut self, user: User) {
        Arc::make_mut(&mut self.users).push(user);
        self.bump();
    }

    pub fn apply_user_update(&mut self, user_id: &str, name: &str) -> bool {
        let Some(index) = self.users.iter().position(|u| u.id == user_id) else {
            return false;
        };
        Arc::make_mut(&mut self.users)[index].name = name.to_string();
        self.bump();
        true
    }

    /// Remove a user and unassign every server that referenced it
    ///
    /// Both changes happen within this call, so no reader can observe a
    /// server pointing at a removed user. Returns the number of servers
    /// that were unassigned, or `None` if the user was not present.
    pub fn apply_user_deletion(&mut self, user_id: &str) -> Option<usize> {
        let index = self.users.iter().position(|u| u.id == user_id)?;

        let assigned = self.servers_assigned_to(user_id);
        if assigned > 0 {
            for server in Arc::make_mut(&mut self.servers).iter_mut() {
                if server.assigned_user_id == user_id {
                    server.assigned_user_id.clear();
                }
            }
        }
        Arc::make_mut(&mut self.users).remove(index);
        self.bump();
        Some(assigned)
    }

    fn server_index(&self, server_id: &str) -> Option<usize> {
        self.servers.iter().position(|s| s.id == server_id)
    }

    fn with_server(&mut self, server_id: &str, f: impl FnOnce(&mut Server)) -> bool {
        let Some(index) = self.server_index(server_id) else {
            return false;
        };
        f(&mut Arc::make_mut(&mut self.servers)[index]);
        self.bump();
        true
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}
