//! Server command handlers

use anyhow::{Context, Result};

use teamdash_core::{Dashboard, NewServer, ServerPatch, ServerStatus, SortConfig, SortKey};

use crate::output::Output;
use crate::prompt::confirm;
use crate::resolve;

/// Options for `server list`
pub struct ListQuery {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub desc: bool,
    pub page: usize,
    pub page_size: usize,
    pub all: bool,
}

/// Field values given to `server add` / `server edit`
pub struct ServerFields {
    pub name: Option<String>,
    pub ip: Option<String>,
    pub status: Option<String>,
    pub user: Option<String>,
    pub notes: Option<String>,
}

/// List servers (filtered, sorted, paginated)
pub fn list(dashboard: &mut Dashboard, query: ListQuery, output: &Output) -> Result<()> {
    let sort = match query.sort {
        Some(ref key) => {
            let key: SortKey = key.parse()?;
            Some(if query.desc {
                SortConfig::desc(key)
            } else {
                SortConfig::asc(key)
            })
        }
        None => None,
    };

    let state = dashboard.view_state_mut();
    if let Some(term) = query.search {
        state.set_server_search(term);
    }
    state.set_sort(sort);
    if query.all {
        state.set_page_size(usize::MAX);
    } else {
        state.set_page_size(query.page_size);
        state.set_page(query.page);
    }

    let view = dashboard.server_view();
    output.print_servers(&view, dashboard.store());
    Ok(())
}

/// Show a single server
pub fn show(dashboard: &Dashboard, server: &str, output: &Output) -> Result<()> {
    let server = resolve::server(dashboard.store(), server)?;
    output.print_server(server, dashboard.store());
    Ok(())
}

/// Add a server
pub async fn add(dashboard: &mut Dashboard, fields: ServerFields, output: &Output) -> Result<()> {
    let mut server = NewServer::new(fields.name.unwrap_or_default());
    if let Some(ip) = fields.ip {
        server = server.main_ip(ip);
    }
    if let Some(ref status) = fields.status {
        server = server.status(parse_status(status)?);
    }
    if let Some(ref user) = fields.user {
        server = server.assigned_to(user_id(dashboard, user)?);
    }
    if let Some(notes) = fields.notes {
        server = server.notes(notes);
    }

    let created = dashboard.add_server(server).await?;
    output.id(&created.id);
    Ok(())
}

/// Edit a server; only the given fields change
pub async fn edit(
    dashboard: &mut Dashboard,
    server: &str,
    fields: ServerFields,
    output: &Output,
) -> Result<()> {
    let server_id = resolve::server(dashboard.store(), server)?.id.clone();

    let status = match fields.status {
        Some(ref status) => Some(parse_status(status)?),
        None => None,
    };
    let assigned_user_id = match fields.user {
        Some(ref user) => Some(user_id(dashboard, user)?),
        None => None,
    };
    let patch = ServerPatch {
        name: fields.name,
        main_ip: fields.ip,
        status,
        assigned_user_id,
        notes: fields.notes,
    };

    if patch.is_empty() {
        output.message("Nothing to change.");
        return Ok(());
    }

    dashboard.update_server(&server_id, patch).await?;
    Ok(())
}

/// Change a server's status
pub async fn set_status(
    dashboard: &mut Dashboard,
    server: &str,
    status: &str,
    output: &Output,
) -> Result<()> {
    let server_id = resolve::server(dashboard.store(), server)?.id.clone();
    let status = parse_status(status)?;

    dashboard.update_server_status(&server_id, status).await?;
    output.id(&server_id);
    Ok(())
}

/// Delete a server
pub async fn delete(dashboard: &mut Dashboard, server: &str, output: &Output) -> Result<()> {
    let server = resolve::server(dashboard.store(), server)?;
    let server_id = server.id.clone();

    // Confirm deletion
    if output.should_prompt() {
        println!(
            "Delete server: {} ({} IP(s), {} domain(s))",
            server.name,
            server.ip_count(),
            server.domain_count()
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    dashboard.delete_server(&server_id).await?;
    Ok(())
}

fn parse_status(status: &str) -> Result<ServerStatus> {
    status
        .parse()
        .with_context(|| format!("Cannot set status to '{}'", status))
}

/// Resolve a `--user` value; "none" or "" unassigns
fn user_id(dashboard: &Dashboard, user: &str) -> Result<String> {
    let user = user.trim();
    if user.is_empty() || user.eq_ignore_ascii_case("none") {
        return Ok(String::new());
    }
    Ok(resolve::user(dashboard.store(), user)?.id.clone())
}
