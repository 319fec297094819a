//! Dashboard: the entity store kept in step with a remote backend
//!
//! `Dashboard` owns the `EntityStore`, the `Backend` and the `ViewState`.
//! Every mutating operation follows the same sequence:
//!
//! 1. Validate the input against the current store (no remote call on
//!    failure)
//! 2. Issue the remote call(s)
//! 3. Only after the backend confirms, apply the change to the store
//! 4. Emit a `Notice` describing the outcome
//!
//! Operations take `&mut self`, so at most one remote call is in flight and
//! responses are always applied in the order the calls were made.
//!
//! ## Usage
//!
//! ```ignore
//! let mut dashboard = Dashboard::open(&config)?;
//! dashboard.refresh().await?;
//!
//! let server = dashboard.add_server(NewServer::new("web-1")).await?;
//! dashboard.add_ips(&server.id, &["10.0.0.1".to_string()]).await?;
//!
//! let view = dashboard.server_view();
//! ```

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{DashboardError, DashboardResult};
use crate::models::{
    Domain, DomainDraft, Ip, NewServer, Server, ServerPatch, ServerStatus, User, DEFAULT_MAIN_IP,
};
use crate::notice::Notice;
use crate::query::{build_server_view, build_user_view, DashboardView, UserView, ViewState};
use crate::remote::{
    backend_from_config, Backend, NewDomainRow, NewIpRow, NewServerRow, NewUserRow,
    RemoteError, ServerPatchRow, UserPatchRow,
};
use crate::store::EntityStore;
use crate::validation::{validate_domains, validate_new_ips};

/// Entity store plus the backend it mirrors
pub struct Dashboard {
    store: EntityStore,
    backend: Box<dyn Backend>,
    view: ViewState,
    notice_tx: mpsc::UnboundedSender<Notice>,
    notice_rx: Option<mpsc::UnboundedReceiver<Notice>>,
}

impl Dashboard {
    /// Create a dashboard with an empty store over `backend`
    pub fn new(backend: impl Backend + 'static, page_size: usize) -> Self {
        Self::from_boxed(Box::new(backend), page_size)
    }

    pub fn from_boxed(backend: Box<dyn Backend>, page_size: usize) -> Self {
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        Self {
            store: EntityStore::new(),
            backend,
            view: ViewState::new(page_size),
            notice_tx,
            notice_rx: Some(notice_rx),
        }
    }

    /// Open the backend selected by the configuration
    ///
    /// The store starts empty; call `refresh` to load it.
    pub fn open(config: &Config) -> Result<Self> {
        let backend = backend_from_config(config)
            .with_context(|| format!("Failed to open {} backend", config.backend))?;
        Ok(Self::from_boxed(backend, config.page_size))
    }

    // ==================== Accessors ====================

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn view_state_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    /// Filtered, sorted and paginated server table
    pub fn server_view(&self) -> DashboardView<'_> {
        build_server_view(&self.store, &self.view)
    }

    /// Filtered user roster
    pub fn user_view(&self) -> UserView<'_> {
        build_user_view(&self.store, &self.view)
    }

    /// Take the notice receiver (can only be called once)
    pub fn take_notices(&mut self) -> Option<mpsc::UnboundedReceiver<Notice>> {
        self.notice_rx.take()
    }

    // ==================== Fetch ====================

    /// Reload every user and server from the backend
    pub async fn refresh(&mut self) -> DashboardResult<()> {
        debug!("Fetching users and servers");
        let users = self
            .backend
            .fetch_users()
            .await
            .map_err(|e| self.remote_failure("load data from database", e))?;
        let servers = self
            .backend
            .fetch_servers_nested()
            .await
            .map_err(|e| self.remote_failure("load data from database", e))?;

        let users: Vec<User> = users.into_iter().map(User::from).collect();
        let servers: Vec<Server> = servers.into_iter().map(Server::from).collect();
        info!("Loaded {} users and {} servers", users.len(), servers.len());

        self.store.replace_all(users, servers);
        Ok(())
    }

    // ==================== Servers ====================

    /// Create a server
    ///
    /// A blank main IP becomes `0.0.0.0`. The assigned user, if any, must
    /// exist.
    pub async fn add_server(&mut self, server: NewServer) -> DashboardResult<Server> {
        let mut server = server;
        server.name = server.name.trim().to_string();
        server.main_ip = server.main_ip.trim().to_string();

        if server.name.is_empty() {
            return Err(self.rejected(DashboardError::MissingField {
                field: "Server name",
            }));
        }
        if server.main_ip.is_empty() {
            server.main_ip = DEFAULT_MAIN_IP.to_string();
        }
        if !server.assigned_user_id.is_empty() && self.store.user(&server.assigned_user_id).is_none()
        {
            return Err(self.rejected(DashboardError::UnknownUser(server.assigned_user_id)));
        }

        debug!("Inserting server {}", server.name);
        let row = self
            .backend
            .insert_server(&NewServerRow::from(&server))
            .await
            .map_err(|e| self.remote_failure("add server", e))?;

        let created = Server::from(row);
        info!("Added server {} ({})", created.name, created.id);
        self.store.apply_new_server(created.clone());
        self.notify(Notice::success(
            "Server added",
            format!("{} has been created successfully", created.name),
        ));
        Ok(created)
    }

    /// Apply a sparse update to a server
    ///
    /// An empty patch succeeds without contacting the backend.
    pub async fn update_server(&mut self, server_id: &str, patch: ServerPatch) -> DashboardResult<()> {
        let patch = self.validate_patch(server_id, patch)?;
        if patch.is_empty() {
            debug!("Empty patch for server {}, nothing to do", server_id);
            return Ok(());
        }

        let status_change = match patch.status {
            Some(status) if patch == ServerPatch::status(status) => Some(status),
            _ => None,
        };
        let failed_action = if status_change.is_some() {
            "update server status"
        } else {
            "update server"
        };

        debug!("Updating server {}", server_id);
        self.backend
            .update_server(server_id, &ServerPatchRow::from(&patch))
            .await
            .map_err(|e| self.remote_failure(failed_action, e))?;

        self.store.apply_server_update(server_id, &patch);
        info!("Updated server {}", server_id);

        match status_change {
            Some(status) => self.notify(Notice::success(
                "Status updated",
                format!("Server status changed to {}", status),
            )),
            None => self.notify(Notice::success(
                "Server updated",
                "Server has been updated successfully",
            )),
        }
        Ok(())
    }

    /// Change only the status of a server
    pub async fn update_server_status(
        &mut self,
        server_id: &str,
        status: ServerStatus,
    ) -> DashboardResult<()> {
        self.update_server(server_id, ServerPatch::status(status)).await
    }

    /// Delete a server; its IPs and domains go with it
    pub async fn delete_server(&mut self, server_id: &str) -> DashboardResult<()> {
        if self.store.server(server_id).is_none() {
            return Err(self.rejected(DashboardError::not_found("Server", server_id)));
        }

        debug!("Deleting server {}", server_id);
        self.backend
            .delete_server(server_id)
            .await
            .map_err(|e| self.remote_failure("delete server", e))?;

        self.store.apply_server_deletion(server_id);
        info!("Deleted server {}", server_id);
        self.notify(Notice::success(
            "Server deleted",
            "Server and all associated data have been removed",
        ));
        Ok(())
    }

    // ==================== IPs ====================

    /// Bind a batch of addresses to a server
    ///
    /// The batch is rejected whole if any address is invalid or already
    /// present. Returns the created IPs in stored order.
    pub async fn add_ips(&mut self, server_id: &str, addresses: &[String]) -> DashboardResult<Vec<Ip>> {
        let Some(server) = self.store.server(server_id) else {
            return Err(self.rejected(DashboardError::not_found("Server", server_id)));
        };
        let addresses = match validate_new_ips(server, addresses) {
            Ok(addresses) => addresses,
            Err(e) => return Err(self.rejected(e)),
        };

        let rows: Vec<NewIpRow> = addresses
            .into_iter()
            .map(|address| NewIpRow {
                address,
                server_id: server_id.to_string(),
            })
            .collect();

        debug!("Inserting {} IPs for server {}", rows.len(), server_id);
        let inserted = self
            .backend
            .insert_ips(&rows)
            .await
            .map_err(|e| self.remote_failure("add IP addresses", e))?;

        let ips: Vec<Ip> = inserted.into_iter().map(Ip::from).collect();
        info!("Added {} IPs to server {}", ips.len(), server_id);
        self.store.apply_new_ips(server_id, ips.clone());
        self.notify(Notice::success(
            "IPs added",
            format!("Successfully added {} IP(s)", ips.len()),
        ));
        Ok(ips)
    }

    /// Remove an IP and its domains
    pub async fn delete_ip(&mut self, server_id: &str, ip_id: &str) -> DashboardResult<()> {
        self.require_ip(server_id, ip_id)?;

        debug!("Deleting IP {}", ip_id);
        self.backend
            .delete_ip(ip_id)
            .await
            .map_err(|e| self.remote_failure("delete IP address", e))?;

        self.store.apply_ip_deletion(server_id, ip_id);
        info!("Deleted IP {} from server {}", ip_id, server_id);
        self.notify(Notice::success(
            "IP deleted",
            "IP address and associated domains removed",
        ));
        Ok(())
    }

    // ==================== Domains ====================

    /// Replace the domain list of an IP
    ///
    /// Existing domains are deleted, then the new list is inserted (skipped
    /// when empty). The IP ends up with exactly `domains`, in order.
    pub async fn replace_domains(
        &mut self,
        server_id: &str,
        ip_id: &str,
        domains: Vec<DomainDraft>,
    ) -> DashboardResult<Vec<Domain>> {
        self.require_ip(server_id, ip_id)?;
        let drafts = match validate_domains(&domains) {
            Ok(drafts) => drafts,
            Err(e) => return Err(self.rejected(e)),
        };

        debug!("Replacing domains for IP {} ({} entries)", ip_id, drafts.len());
        self.backend
            .delete_domains_for_ip(ip_id)
            .await
            .map_err(|e| self.remote_failure("update domains", e))?;

        let stored = if drafts.is_empty() {
            Vec::new()
        } else {
            let rows: Vec<NewDomainRow> = drafts
                .iter()
                .map(|draft| NewDomainRow::from_draft(draft, ip_id))
                .collect();
            match self.backend.insert_domains(&rows).await {
                Ok(stored) => stored,
                Err(e) => {
                    // The old list is already gone remotely; the store keeps
                    // it until the next refresh.
                    return Err(self.remote_failure("update domains", e));
                }
            }
        };

        let stored: Vec<Domain> = stored.into_iter().map(Domain::from).collect();
        info!("Set {} domains on IP {}", stored.len(), ip_id);
        self.store
            .apply_domains_replacement(server_id, ip_id, stored.clone());
        self.notify(Notice::success(
            "Domains updated",
            "Domain list has been updated successfully",
        ));
        Ok(stored)
    }

    // ==================== Users ====================

    pub async fn add_user(&mut self, name: &str) -> DashboardResult<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(self.rejected(DashboardError::MissingField { field: "Name" }));
        }

        debug!("Inserting user {}", name);
        let row = self
            .backend
            .insert_user(&NewUserRow {
                name: name.to_string(),
            })
            .await
            .map_err(|e| self.remote_failure("add user", e))?;

        let user = User::from(row);
        info!("Added user {} ({})", user.name, user.id);
        self.store.apply_new_user(user.clone());
        self.notify(Notice::success(
            "User added",
            format!("{} has been created successfully", user.name),
        ));
        Ok(user)
    }

    pub async fn update_user(&mut self, user_id: &str, name: &str) -> DashboardResult<()> {
        let name = name.trim();
        if self.store.user(user_id).is_none() {
            return Err(self.rejected(DashboardError::not_found("User", user_id)));
        }
        if name.is_empty() {
            return Err(self.rejected(DashboardError::MissingField { field: "Name" }));
        }

        debug!("Renaming user {}", user_id);
        self.backend
            .update_user(
                user_id,
                &UserPatchRow {
                    name: name.to_string(),
                },
            )
            .await
            .map_err(|e| self.remote_failure("update user", e))?;

        self.store.apply_user_update(user_id, name);
        info!("Updated user {}", user_id);
        self.notify(Notice::success(
            "User updated",
            "User has been updated successfully",
        ));
        Ok(())
    }

    /// Delete a user, unassigning every server they own
    ///
    /// Returns the number of servers that were unassigned.
    pub async fn delete_user(&mut self, user_id: &str) -> DashboardResult<usize> {
        if self.store.user(user_id).is_none() {
            return Err(self.rejected(DashboardError::not_found("User", user_id)));
        }

        debug!("Unassigning servers of user {}", user_id);
        self.backend
            .unassign_user(user_id)
            .await
            .map_err(|e| self.remote_failure("delete user", e))?;
        debug!("Deleting user {}", user_id);
        self.backend
            .delete_user(user_id)
            .await
            .map_err(|e| self.remote_failure("delete user", e))?;

        let unassigned = self.store.apply_user_deletion(user_id).unwrap_or(0);
        info!("Deleted user {} ({} servers unassigned)", user_id, unassigned);
        self.notify(Notice::success(
            "User deleted",
            "User has been removed and unassigned from all servers",
        ));
        Ok(unassigned)
    }

    // ==================== Helpers ====================

    /// Check a patch against the store, trimming text fields
    fn validate_patch(&self, server_id: &str, patch: ServerPatch) -> DashboardResult<ServerPatch> {
        if self.store.server(server_id).is_none() {
            return Err(self.rejected(DashboardError::not_found("Server", server_id)));
        }

        let mut patch = patch;
        if let Some(name) = patch.name.as_mut() {
            *name = name.trim().to_string();
            if name.is_empty() {
                return Err(self.rejected(DashboardError::MissingField {
                    field: "Server name",
                }));
            }
        }
        if let Some(main_ip) = patch.main_ip.as_mut() {
            *main_ip = main_ip.trim().to_string();
            if main_ip.is_empty() {
                return Err(self.rejected(DashboardError::MissingField { field: "Main IP" }));
            }
        }
        if let Some(user_id) = patch.assigned_user_id.as_ref() {
            if !user_id.is_empty() && self.store.user(user_id).is_none() {
                return Err(self.rejected(DashboardError::UnknownUser(user_id.clone())));
            }
        }
        Ok(patch)
    }

    fn require_ip(&self, server_id: &str, ip_id: &str) -> DashboardResult<()> {
        let Some(server) = self.store.server(server_id) else {
            return Err(self.rejected(DashboardError::not_found("Server", server_id)));
        };
        if server.ip(ip_id).is_none() {
            return Err(self.rejected(DashboardError::not_found("IP", ip_id)));
        }
        Ok(())
    }

    fn notify(&self, notice: Notice) {
        // Nobody listening is fine
        let _ = self.notice_tx.send(notice);
    }

    /// Report a validation failure
    fn rejected(&self, err: DashboardError) -> DashboardError {
        debug!("Rejected: {}", err);
        let title = match err {
            DashboardError::InvalidIps { .. } => "Invalid IP addresses",
            DashboardError::DuplicateIps { .. } => "Duplicate IP addresses",
            _ => "Error",
        };
        self.notify(Notice::error(title, err.to_string()));
        err
    }

    /// Report a backend failure; the store is left as it was
    fn remote_failure(&self, action: &str, err: RemoteError) -> DashboardError {
        warn!("Failed to {}: {}", action, err);
        self.notify(Notice::error("Error", format!("Failed to {}", action)));
        DashboardError::Remote(err)
    }
}
